//! Bucketgate Core - authentication, access policy and object storage
//!
//! Everything the HTTP layer needs that is not HTTP: configuration, typed
//! errors, sessions and the access gate, the content store abstraction and
//! the object gateway on top of it.

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod types;

pub use auth::*;
pub use config::*;
pub use error::*;
pub use gateway::ObjectGateway;
pub use logging::*;
pub use store::{ContentStore, MemoryStore, S3Store};
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
