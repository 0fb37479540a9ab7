//! In-memory adapters for the three ports (§4.10), used by unit and
//! scenario tests in place of the production HTTP/reqwest-backed clients.

pub mod custom_resource_client;
pub mod database_client;
pub mod kube_client;

pub use custom_resource_client::MemoryCustomResourceClient;
pub use database_client::MemoryDatabaseClient;
pub use kube_client::MemoryKubeClient;
