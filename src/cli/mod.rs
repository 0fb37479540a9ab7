//! Thin process entry point (§6 "CLI"): loads configuration, initializes
//! logging, constructs the production adapters, and wires them into a
//! `Controller`. The generic watch/list machinery that would drive
//! `Controller::on_add`/`on_update`/`on_delete` in a real cluster is out of
//! scope (§1) — `run` sketches the wiring and blocks until shutdown.

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use crate::adapters::http::{HttpCustomResourceClient, HttpDatabaseClient, HttpKubeClient};
use crate::infrastructure::config::{ConfigError, ConfigLoader};
use crate::infrastructure::logging::{LoggerError, LoggerImpl};
use crate::services::Controller;

/// Command-line flags. Everything else (service account, chaos flag,
/// reconciliation tunables, log level/format) comes from `ConfigLoader`
/// (defaults → `operator.yaml`/`operator.local.yaml` → `OPERATOR_`-prefixed
/// environment), per §4.8 — these flags only point at endpoints.
#[derive(Debug, Parser)]
#[command(name = "arangodb-operator", about = "Operator for ArangoDB-shaped deployments")]
pub struct Args {
    /// Base URL of the Kubernetes-style object API (pods/services/PVCs/secrets/events).
    #[arg(long, env = "OPERATOR_API_SERVER_URL", default_value = "https://kubernetes.default.svc")]
    pub api_server_url: String,

    /// Endpoint template for the database's own HTTP API, with `{namespace}`/`{name}` placeholders.
    #[arg(long, env = "OPERATOR_DATABASE_ENDPOINT_TEMPLATE", default_value = "https://{name}.{namespace}.svc:8529")]
    pub database_endpoint_template: String,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logger(#[from] LoggerError),
    #[error("failed to build HTTP adapter: {0}")]
    HttpAdapter(#[from] reqwest::Error),
}

/// Loads config, starts logging, builds the production adapters, and
/// returns a ready-to-drive `Controller`. Kept separate from `main` so
/// integration tests can exercise the wiring without a `clap::Parser::parse`
/// call against real `std::env::args`.
pub fn bootstrap(args: &Args) -> Result<Controller, RunError> {
    let config = ConfigLoader::load()?;
    LoggerImpl::init(&config.log)?;

    let kube = Arc::new(HttpKubeClient::new(args.api_server_url.clone())?);
    let cr = Arc::new(HttpCustomResourceClient::new(args.api_server_url.clone())?);
    let db = Arc::new(HttpDatabaseClient::new(args.database_endpoint_template.clone())?);

    Ok(Controller::new(config, kube, cr, Some(db)))
}
