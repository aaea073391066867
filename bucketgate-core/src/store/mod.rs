//! Content store abstraction
//!
//! The gateway only needs put/get/list/delete by key inside one bucket.
//! [`S3Store`] talks to S3-compatible services such as MinIO; [`MemoryStore`]
//! keeps objects in process for local runs and tests.

pub mod memory;
pub mod multipart;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use crate::error::StorageResult;
use crate::types::{ObjectBody, ObjectPayload};
use async_trait::async_trait;

/// Remote object storage addressed by key within a configured bucket.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Bucket the store writes into
    fn bucket(&self) -> &str;

    /// Write the whole stream under `key`; returns bytes written.
    async fn put_object(&self, key: &str, body: ObjectBody<'_>) -> StorageResult<u64>;

    /// Open `key` for streaming. Missing keys are `StorageError::NotFound`.
    async fn get_object(&self, key: &str) -> StorageResult<ObjectPayload>;

    /// Every key in the bucket, in the store's listing order.
    async fn list_objects(&self) -> StorageResult<Vec<String>>;

    /// Remove `key`. Whether a missing key is an error is up to the store.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;
}
