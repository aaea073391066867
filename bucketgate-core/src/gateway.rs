//! Object gateway: names, streams and lists objects in the shared bucket

use crate::error::{GatewayError, GatewayResult, StorageResult};
use crate::store::ContentStore;
use crate::types::{file_name_of, ObjectBody, ObjectDownload, ObjectKey, StoredObject};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Translates the HTTP object operations into single content store calls.
///
/// Holds no per-request state; every call goes straight to the store and
/// nothing is retried.
#[derive(Clone)]
pub struct ObjectGateway {
    store: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for ObjectGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectGateway")
            .field("backend", &self.store.backend())
            .field("bucket", &self.store.bucket())
            .finish()
    }
}

impl ObjectGateway {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Stream `body` into the store under a fresh `{millis}-{name}` key.
    ///
    /// Only the last path segment of `original_name` is kept. An empty name
    /// is a validation error and nothing is written.
    pub async fn upload(
        &self,
        original_name: &str,
        body: ObjectBody<'_>,
    ) -> GatewayResult<StoredObject> {
        self.upload_at(original_name, body, Utc::now()).await
    }

    #[instrument(skip(self, body), fields(bucket = %self.store.bucket()))]
    pub async fn upload_at(
        &self,
        original_name: &str,
        body: ObjectBody<'_>,
        now: DateTime<Utc>,
    ) -> GatewayResult<StoredObject> {
        let name = file_name_of(original_name.trim());
        if name.is_empty() {
            return Err(crate::validation_error!(
                "No file uploaded",
                "file",
                "gateway"
            ));
        }

        let key = ObjectKey::generate(name, now);
        let size = self
            .store
            .put_object(key.as_str(), body)
            .await
            .map_err(|e| {
                error!(%key, error = %e, source = ?std::error::Error::source(&e), "Upload failed");
                GatewayError::from(e)
            })?;

        info!(%key, size, "Object uploaded");
        Ok(StoredObject {
            key,
            original_name: name.to_string(),
            created_at: now,
            size,
        })
    }

    /// Every key currently in the bucket, fetched fresh.
    pub async fn list(&self) -> StorageResult<Vec<ObjectKey>> {
        let keys = self.store.list_objects().await?;
        Ok(keys.into_iter().map(ObjectKey::from).collect())
    }

    /// Open `key` for streaming to a client.
    pub async fn download(&self, key: &str) -> StorageResult<ObjectDownload> {
        let payload = self.store.get_object(key).await?;
        let key = ObjectKey::from(key);
        let file_name = key.file_name().to_string();

        Ok(ObjectDownload {
            key,
            file_name,
            payload,
        })
    }

    /// Remove `key`. Deleting a key that does not exist is not an error.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.store.delete_object(key).await?;
        info!(%key, "Object deleted");
        Ok(())
    }
}
