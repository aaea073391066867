//! Gateway configuration
//!
//! Loaded from an optional TOML file, then overridden by `BUCKETGATE_*`
//! environment variables and finally by command line flags.

use crate::error::{GatewayError, GatewayResult};
use crate::logging::LoggingConfig;
use crate::{config_error, validation_error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// S3 refuses multipart parts smaller than this, except the last one.
pub const MIN_PART_SIZE_MB: usize = 5;

/// Complete gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`, `/assets` and `/public`
    pub static_dir: PathBuf,
    /// Mark the session cookie `Secure` (enable behind HTTPS)
    pub secure_cookies: bool,
    pub max_upload_mb: usize,
    /// Allowed CORS origins; empty means permissive
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            static_dir: PathBuf::from("public"),
            secure_cookies: false,
            max_upload_mb: 1024,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Which content store implementation backs the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    S3,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" | "minio" => Ok(StoreBackend::S3),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(validation_error!(
                format!("unknown storage backend '{}'", other),
                "storage.backend",
                "config"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StoreBackend,
    pub bucket: String,
    /// S3-compatible endpoint, e.g. a MinIO server
    pub endpoint: Option<String>,
    pub region: String,
    /// Static access key; falls back to the AWS default credential chain
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Create the bucket at startup when it does not exist
    pub create_bucket: bool,
    /// Size of one streamed multipart part, and the upper bound of upload buffering
    pub part_size_mb: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::S3,
            bucket: "uploads".to_string(),
            endpoint: Some("http://localhost:9000".to_string()),
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
            create_bucket: false,
            part_size_mb: 8,
            connect_timeout_secs: 5,
            read_timeout_secs: 60,
        }
    }
}

impl StorageConfig {
    pub fn part_size_bytes(&self) -> usize {
        self.part_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Lifetime of a "remember me" session
    pub remember_days: i64,
    /// How often expired sessions are swept from memory
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "bucketgate.sid".to_string(),
            remember_days: 7,
            sweep_interval_secs: 300,
        }
    }
}

impl SessionConfig {
    pub fn remember_for(&self) -> chrono::Duration {
        chrono::Duration::days(self.remember_days)
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GatewayError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> GatewayResult<Self> {
        toml::from_str(content).map_err(|e| GatewayError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Apply `BUCKETGATE_*` environment variables on top of the loaded values
    pub fn apply_env_overrides(&mut self) -> GatewayResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> GatewayResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BUCKETGATE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BUCKETGATE_PORT") {
            self.server.port = port.parse().map_err(|e| {
                config_error!(format!("invalid BUCKETGATE_PORT '{}'", port), "config", e)
            })?;
        }
        if let Some(bucket) = lookup("BUCKETGATE_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(endpoint) = lookup("BUCKETGATE_S3_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(access_key) = lookup("BUCKETGATE_S3_ACCESS_KEY") {
            self.storage.access_key = Some(access_key);
        }
        if let Some(secret_key) = lookup("BUCKETGATE_S3_SECRET_KEY") {
            self.storage.secret_key = Some(secret_key);
        }
        if let Some(backend) = lookup("BUCKETGATE_STORE") {
            self.storage.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> GatewayResult<()> {
        if self.server.port == 0 {
            return Err(validation_error!(
                "Server port must be greater than 0",
                "server.port",
                "config"
            ));
        }

        if self.server.max_upload_mb == 0 {
            return Err(validation_error!(
                "max_upload_mb must be greater than 0",
                "server.max_upload_mb",
                "config"
            ));
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(validation_error!(
                "Bucket name must not be empty",
                "storage.bucket",
                "config"
            ));
        }

        if self.storage.part_size_mb < MIN_PART_SIZE_MB {
            return Err(validation_error!(
                format!("part_size_mb must be at least {}", MIN_PART_SIZE_MB),
                "storage.part_size_mb",
                "config"
            ));
        }

        if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
            return Err(validation_error!(
                "access_key and secret_key must be set together",
                "storage.access_key",
                "config"
            ));
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(validation_error!(
                "Session cookie name must not be empty",
                "session.cookie_name",
                "config"
            ));
        }

        if self.session.remember_days <= 0 {
            return Err(validation_error!(
                "remember_days must be greater than 0",
                "session.remember_days",
                "config"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.storage.bucket, "uploads");
        assert_eq!(config.session.remember_for(), chrono::Duration::days(7));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GatewayConfig::from_toml_str(
            r#"
            [server]
            port = 8088

            [storage]
            backend = "memory"
            bucket = "shared"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StoreBackend::Memory);
        assert_eq!(config.storage.bucket, "shared");
        assert_eq!(config.storage.part_size_mb, 8);
        assert_eq!(config.session.cookie_name, "bucketgate.sid");
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let error = GatewayConfig::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(error, GatewayError::Config { .. }));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let error = GatewayConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(error, GatewayError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BUCKETGATE_PORT", "9100"),
            ("BUCKETGATE_BUCKET", "team-files"),
            ("BUCKETGATE_STORE", "memory"),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.bucket, "team-files");
        assert_eq!(config.storage.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        let mut config = GatewayConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "BUCKETGATE_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_small_parts() {
        let mut config = GatewayConfig::default();
        config.storage.part_size_mb = 1;
        assert!(matches!(
            config.validate(),
            Err(GatewayError::Validation { .. })
        ));
    }

    #[test]
    fn test_validation_requires_key_pair() {
        let mut config = GatewayConfig::default();
        config.storage.access_key = Some("minio".to_string());
        assert!(config.validate().is_err());

        config.storage.secret_key = Some("minio123".to_string());
        assert!(config.validate().is_ok());
    }
}
