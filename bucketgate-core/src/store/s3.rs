//! S3-compatible content store.
//!
//! Uploads go through [`stream_upload`]: at most one part
//! (`storage.part_size_mb`) is held in memory. A payload that fits in one part
//! goes out as a single PutObject, anything larger as a multipart upload.

use super::multipart::{stream_upload, PartSink, UploadedPart};
use super::ContentStore;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::types::{ObjectBody, ObjectPayload};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

/// High-level wrapper around the bucket holding uploaded objects.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    part_size: usize,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, part_size: usize) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            part_size,
        }
    }

    /// Build a client from the storage section: explicit endpoint (MinIO),
    /// path-style addressing, optional static keys, bounded timeouts.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(timeouts);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "bucketgate-config",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 client initialised"
        );

        Self::new(
            Client::from_conf(s3_config),
            config.bucket.clone(),
            config.part_size_bytes(),
        )
    }

    /// Create the bucket when it does not exist yet.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn ensure_bucket(&self) -> StorageResult<()> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            debug!("bucket exists");
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::write_failed(&self.bucket, e))?;

        info!("bucket created");
        Ok(())
    }
}

#[async_trait]
impl PartSink for S3Store {
    async fn put_whole(&self, key: &str, data: Bytes) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_length(data.len() as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::write_failed(key, e))?;
        Ok(())
    }

    async fn begin(&self, key: &str) -> StorageResult<String> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::write_failed(key, e))?;

        created
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| StorageError::write_failed(key, "store returned no upload id"))
    }

    async fn put_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StorageResult<UploadedPart> {
        let uploaded = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(data.len() as i64)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::write_failed(key, e))?;

        Ok(UploadedPart {
            part_number,
            e_tag: uploaded.e_tag().map(str::to_string),
        })
    }

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> StorageResult<()> {
        let parts = parts
            .into_iter()
            .map(|part| {
                CompletedPart::builder()
                    .part_number(part.part_number)
                    .set_e_tag(part.e_tag)
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| StorageError::write_failed(key, e))?;
        Ok(())
    }

    async fn abort(&self, key: &str, upload_id: &str) -> StorageResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| {
                debug!(%key, error = %DisplayErrorContext(&e), "abort request failed");
                StorageError::write_failed(key, e)
            })?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for S3Store {
    fn backend(&self) -> &'static str {
        "s3"
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, body), fields(bucket = %self.bucket, %key))]
    async fn put_object(&self, key: &str, body: ObjectBody<'_>) -> StorageResult<u64> {
        let size = stream_upload(self, key, body, self.part_size).await?;
        debug!(size, "object uploaded");
        Ok(size)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn get_object(&self, key: &str) -> StorageResult<ObjectPayload> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                debug!("object does not exist");
                return Err(StorageError::not_found(key));
            }
            Err(err) => return Err(StorageError::read_failed(key, err)),
        };

        let content_length = response
            .content_length()
            .and_then(|len| u64::try_from(len).ok());

        // Dropping the stream (client disconnect) drops the SDK body and
        // releases the connection.
        let body = ReaderStream::new(response.body.into_async_read()).boxed();

        Ok(ObjectPayload {
            body,
            content_length,
        })
    }

    /// Paginates through the whole bucket; a failure on any page discards
    /// the keys gathered so far.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(ref token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(StorageError::list_failed)?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = keys.len(), "listed objects");
        Ok(keys)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket, %key))]
    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(key, e))?;

        debug!("object deleted");
        Ok(())
    }
}
