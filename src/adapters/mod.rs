//! Concrete implementations of the `domain::ports` traits: production
//! HTTP adapters and in-memory test doubles.

pub mod http;
pub mod memory;
