//! The core: plain data shapes (`models`), the error taxonomy (`errors`),
//! and the port traits the core depends on but does not implement
//! (`ports`). Nothing in this module depends on `adapters`, `services`,
//! `infrastructure`, or `cli`.

pub mod errors;
pub mod models;
pub mod ports;
