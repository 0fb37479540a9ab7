//! Operator process entry point.

use clap::Parser;

use arangodb_operator::cli::{bootstrap, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let controller = bootstrap(&args)?;

    tracing::info!("operator started, awaiting shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!(deployments = controller.deployment_count().await, "shutting down");

    Ok(())
}
