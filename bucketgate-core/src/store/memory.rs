//! In-process content store

use super::ContentStore;
use crate::error::{StorageError, StorageResult};
use crate::types::{ObjectBody, ObjectPayload};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Objects held in memory, listed in key order. Deleting a missing key
/// succeeds, like S3.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("uploads")
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: ObjectBody<'_>) -> StorageResult<u64> {
        // Nothing is stored unless the whole stream arrives.
        let data = body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .map_err(|e| StorageError::write_failed(key, e))?
            .freeze();

        let size = data.len() as u64;
        self.objects.write().await.insert(key.to_string(), data);
        debug!(%key, size, "object stored in memory");
        Ok(size)
    }

    async fn get_object(&self, key: &str) -> StorageResult<ObjectPayload> {
        let data = self
            .objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))?;

        let content_length = Some(data.len() as u64);
        Ok(ObjectPayload {
            body: stream::once(async move { Ok(data) }).boxed(),
            content_length,
        })
    }

    async fn list_objects(&self) -> StorageResult<Vec<String>> {
        Ok(self.objects.read().await.keys().cloned().collect())
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&'static str]) -> ObjectBody<'static> {
        let chunks: Vec<std::io::Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        stream::iter(chunks).boxed()
    }

    async fn read_all(payload: ObjectPayload) -> Vec<u8> {
        payload
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryStore::new("uploads");
        let written = store
            .put_object("k", body(&["hello ", "world"]))
            .await
            .unwrap();
        assert_eq!(written, 11);

        let payload = store.get_object("k").await.unwrap();
        assert_eq!(payload.content_length, Some(11));
        assert_eq!(read_all(payload).await, b"hello world");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = MemoryStore::default();
        let error = store.get_object("nope").await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_stream_stores_nothing() {
        let store = MemoryStore::default();
        let failing: ObjectBody<'static> = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "client went away")),
        ])
        .boxed();

        let error = store.put_object("k", failing).await.unwrap_err();
        assert!(matches!(error, StorageError::WriteFailed { .. }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_delete_is_idempotent() {
        let store = MemoryStore::default();
        store.put_object("b", body(&["2"])).await.unwrap();
        store.put_object("a", body(&["1"])).await.unwrap();

        assert_eq!(store.list_objects().await.unwrap(), vec!["a", "b"]);

        store.delete_object("a").await.unwrap();
        store.delete_object("a").await.unwrap();
        store.delete_object("never-existed").await.unwrap();
        assert_eq!(store.list_objects().await.unwrap(), vec!["b"]);
    }
}
