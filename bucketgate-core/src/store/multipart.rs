//! Bounded-buffer streaming upload
//!
//! [`stream_upload`] holds at most one part in memory. A payload that fits in
//! one part is written whole; anything larger becomes a multipart upload that
//! is aborted when a part, the body stream or the final commit fails.

use crate::error::{StorageError, StorageResult};
use crate::types::ObjectBody;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use tracing::{debug, warn};

/// A part accepted by the store, to be listed when the upload is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    pub part_number: i32,
    pub e_tag: Option<String>,
}

/// Store-side operations of a streamed upload.
#[async_trait]
pub trait PartSink: Send + Sync {
    /// Write a payload that fit in a single part.
    async fn put_whole(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Start a multipart upload; returns its upload id.
    async fn begin(&self, key: &str) -> StorageResult<String>;

    async fn put_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StorageResult<UploadedPart>;

    async fn complete(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedPart>,
    ) -> StorageResult<()>;

    async fn abort(&self, key: &str, upload_id: &str) -> StorageResult<()>;
}

/// Stream `body` into `sink` under `key` in parts of at least `part_size`
/// bytes (the last may be shorter). Returns the bytes written.
pub async fn stream_upload<S>(
    sink: &S,
    key: &str,
    mut body: ObjectBody<'_>,
    part_size: usize,
) -> StorageResult<u64>
where
    S: PartSink + ?Sized,
{
    let mut buffer = BytesMut::with_capacity(part_size);
    let exhausted = fill_part(&mut body, &mut buffer, part_size)
        .await
        .map_err(|e| StorageError::write_failed(key, e))?;
    let first_part = buffer.split().freeze();

    if exhausted {
        let size = first_part.len() as u64;
        sink.put_whole(key, first_part).await?;
        return Ok(size);
    }

    let upload_id = sink.begin(key).await?;

    let result: StorageResult<u64> = async {
        let (parts, size) =
            send_parts(sink, key, &upload_id, first_part, body, buffer, part_size).await?;
        sink.complete(key, &upload_id, parts).await?;
        Ok(size)
    }
    .await;

    if result.is_err() {
        // Nothing was committed; release the parts already sent.
        if let Err(abort) = sink.abort(key, &upload_id).await {
            warn!(
                %key,
                %upload_id,
                error = %abort,
                source = ?std::error::Error::source(&abort),
                "failed to abort multipart upload"
            );
        }
    }

    result
}

async fn send_parts<S>(
    sink: &S,
    key: &str,
    upload_id: &str,
    first_part: Bytes,
    mut body: ObjectBody<'_>,
    mut buffer: BytesMut,
    part_size: usize,
) -> StorageResult<(Vec<UploadedPart>, u64)>
where
    S: PartSink + ?Sized,
{
    let mut parts = Vec::new();
    let mut size = 0u64;
    let mut part = first_part;

    loop {
        let part_number = parts.len() as i32 + 1;
        size += part.len() as u64;
        parts.push(sink.put_part(key, upload_id, part_number, part).await?);

        // The stream is never polled again once it has ended.
        let exhausted = fill_part(&mut body, &mut buffer, part_size)
            .await
            .map_err(|e| StorageError::write_failed(key, e))?;
        if buffer.is_empty() {
            break;
        }
        part = buffer.split().freeze();
        if exhausted {
            let part_number = parts.len() as i32 + 1;
            size += part.len() as u64;
            parts.push(sink.put_part(key, upload_id, part_number, part).await?);
            break;
        }
    }

    debug!(%key, parts = parts.len(), size, "multipart upload parts sent");
    Ok((parts, size))
}

/// Pull chunks from `body` into `buffer` until it holds at least `part_size`
/// bytes or the stream ends. Returns `true` once the stream is exhausted.
pub(crate) async fn fill_part(
    body: &mut ObjectBody<'_>,
    buffer: &mut BytesMut,
    part_size: usize,
) -> std::io::Result<bool> {
    while buffer.len() < part_size {
        match body.try_next().await? {
            Some(chunk) => buffer.extend_from_slice(&chunk),
            None => return Ok(true),
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};
    use std::sync::Mutex;

    fn chunked(chunks: Vec<std::io::Result<Bytes>>) -> ObjectBody<'static> {
        stream::iter(chunks).boxed()
    }

    fn ok(data: &'static [u8]) -> std::io::Result<Bytes> {
        Ok(Bytes::from_static(data))
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Whole(usize),
        Begin,
        Part(i32, usize),
        Complete(Vec<i32>),
        Abort,
    }

    /// Records every store call; optionally fails one part or the commit.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<Call>>,
        fail_part: Option<i32>,
        fail_complete: bool,
    }

    impl RecordingSink {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PartSink for RecordingSink {
        async fn put_whole(&self, _key: &str, data: Bytes) -> StorageResult<()> {
            self.record(Call::Whole(data.len()));
            Ok(())
        }

        async fn begin(&self, _key: &str) -> StorageResult<String> {
            self.record(Call::Begin);
            Ok("upload-1".to_string())
        }

        async fn put_part(
            &self,
            key: &str,
            upload_id: &str,
            part_number: i32,
            data: Bytes,
        ) -> StorageResult<UploadedPart> {
            assert_eq!(upload_id, "upload-1");
            self.record(Call::Part(part_number, data.len()));
            if self.fail_part == Some(part_number) {
                return Err(StorageError::write_failed(key, "part rejected"));
            }
            Ok(UploadedPart {
                part_number,
                e_tag: Some(format!("etag-{part_number}")),
            })
        }

        async fn complete(
            &self,
            key: &str,
            _upload_id: &str,
            parts: Vec<UploadedPart>,
        ) -> StorageResult<()> {
            self.record(Call::Complete(
                parts.iter().map(|p| p.part_number).collect(),
            ));
            if self.fail_complete {
                return Err(StorageError::write_failed(key, "commit rejected"));
            }
            Ok(())
        }

        async fn abort(&self, _key: &str, _upload_id: &str) -> StorageResult<()> {
            self.record(Call::Abort);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_small_payload_is_written_whole() {
        let sink = RecordingSink::default();
        let body = chunked(vec![ok(b"tiny")]);

        let size = stream_upload(&sink, "k", body, 1024).await.unwrap();

        assert_eq!(size, 4);
        assert_eq!(sink.calls(), vec![Call::Whole(4)]);
    }

    #[tokio::test]
    async fn test_empty_payload_is_written_whole() {
        let sink = RecordingSink::default();

        let size = stream_upload(&sink, "k", chunked(vec![]), 1024).await.unwrap();

        assert_eq!(size, 0);
        assert_eq!(sink.calls(), vec![Call::Whole(0)]);
    }

    #[tokio::test]
    async fn test_large_payload_sends_numbered_parts_then_completes() {
        let sink = RecordingSink::default();
        let body = chunked(vec![ok(b"aa"), ok(b"aa"), ok(b"bbbb"), ok(b"cc")]);

        let size = stream_upload(&sink, "k", body, 4).await.unwrap();

        assert_eq!(size, 10);
        assert_eq!(
            sink.calls(),
            vec![
                Call::Begin,
                Call::Part(1, 4),
                Call::Part(2, 4),
                Call::Part(3, 2),
                Call::Complete(vec![1, 2, 3]),
            ]
        );
    }

    #[tokio::test]
    async fn test_payload_on_part_boundary_has_no_empty_tail_part() {
        let sink = RecordingSink::default();
        let body = chunked(vec![ok(b"aaaa"), ok(b"bbbb")]);

        let size = stream_upload(&sink, "k", body, 4).await.unwrap();

        assert_eq!(size, 8);
        assert_eq!(
            sink.calls(),
            vec![
                Call::Begin,
                Call::Part(1, 4),
                Call::Part(2, 4),
                Call::Complete(vec![1, 2]),
            ]
        );
    }

    #[tokio::test]
    async fn test_body_error_after_first_part_aborts_upload() {
        let sink = RecordingSink::default();
        let body = chunked(vec![
            ok(b"aaaa"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let error = stream_upload(&sink, "k", body, 4).await.unwrap_err();

        assert!(matches!(error, StorageError::WriteFailed { .. }));
        assert_eq!(
            sink.calls(),
            vec![Call::Begin, Call::Part(1, 4), Call::Abort]
        );
    }

    #[tokio::test]
    async fn test_rejected_part_aborts_upload() {
        let sink = RecordingSink {
            fail_part: Some(2),
            ..Default::default()
        };
        let body = chunked(vec![ok(b"aaaa"), ok(b"bbbb"), ok(b"cccc")]);

        stream_upload(&sink, "k", body, 4).await.unwrap_err();

        assert_eq!(
            sink.calls(),
            vec![Call::Begin, Call::Part(1, 4), Call::Part(2, 4), Call::Abort]
        );
    }

    #[tokio::test]
    async fn test_failed_commit_aborts_upload() {
        let sink = RecordingSink {
            fail_complete: true,
            ..Default::default()
        };
        let body = chunked(vec![ok(b"aaaa"), ok(b"bb")]);

        stream_upload(&sink, "k", body, 4).await.unwrap_err();

        assert_eq!(
            sink.calls(),
            vec![
                Call::Begin,
                Call::Part(1, 4),
                Call::Part(2, 2),
                Call::Complete(vec![1, 2]),
                Call::Abort,
            ]
        );
    }

    #[tokio::test]
    async fn test_fill_part_stops_at_part_size() {
        let mut body = chunked(vec![ok(b"aaaa"), ok(b"bbbb"), ok(b"cccc")]);
        let mut buffer = BytesMut::new();

        let exhausted = fill_part(&mut body, &mut buffer, 6).await.unwrap();
        assert!(!exhausted);
        assert_eq!(&buffer[..], b"aaaabbbb");

        buffer.clear();
        let exhausted = fill_part(&mut body, &mut buffer, 6).await.unwrap();
        assert!(exhausted);
        assert_eq!(&buffer[..], b"cccc");
    }

    #[tokio::test]
    async fn test_fill_part_propagates_stream_errors() {
        let mut body = chunked(vec![
            ok(b"ok"),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);
        let mut buffer = BytesMut::new();

        let error = fill_part(&mut body, &mut buffer, 1024).await.unwrap_err();
        assert_eq!(error.kind(), std::io::ErrorKind::ConnectionReset);
    }
}
