//! Production, `reqwest`-backed adapters for the three ports (§6). The
//! generic watch/list/informer machinery each of these would normally sit
//! behind is out of scope (§1) — these are thin, stateless REST clients.

pub mod custom_resource_client;
pub mod database_client;
pub mod kube_client;

pub use custom_resource_client::HttpCustomResourceClient;
pub use database_client::HttpDatabaseClient;
pub use kube_client::HttpKubeClient;
