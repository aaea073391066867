//! Core data types shared by the gateway and its HTTP surface

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// A streamed object body, either inbound (upload) or outbound (download).
pub type ObjectBody<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// Username/password pair loaded from the credentials file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of debug output and logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Object key in the shared bucket namespace: `{epoch-millis}-{original name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Derive the key for an upload issued at `at`.
    pub fn generate(original_name: &str, at: DateTime<Utc>) -> Self {
        Self(format!("{}-{}", at.timestamp_millis(), original_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Final path segment of the key, used as the download file name hint.
    pub fn file_name(&self) -> &str {
        file_name_of(&self.0)
    }
}

impl From<String> for ObjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final segment of a `/` or `\` separated path.
///
/// `"a/b/c.txt"` → `"c.txt"`, `"../x"` → `"x"`, `"dir/"` → `""`.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// An object written through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub original_name: String,
    pub created_at: DateTime<Utc>,
    /// Bytes transferred to the store.
    pub size: u64,
}

/// A store read: the byte stream plus its length when the store reports one.
pub struct ObjectPayload {
    pub body: ObjectBody<'static>,
    pub content_length: Option<u64>,
}

impl std::fmt::Debug for ObjectPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPayload")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// An object ready to be streamed to an HTTP client.
#[derive(Debug)]
pub struct ObjectDownload {
    pub key: ObjectKey,
    /// Attachment name derived from the key's final path segment.
    pub file_name: String,
    pub payload: ObjectPayload,
}
