//! Credential loading and lookup

use crate::error::{ErrorContext, GatewayError, GatewayResult};
use crate::types::Credential;
use crate::config_error;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// The credentials file holds either a list of users or a single user.
#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialFile {
    Many(Vec<Credential>),
    Single(Credential),
}

/// Read-only username/password list, loaded once at startup.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials: Vec<Credential>,
}

impl CredentialStore {
    /// Build a store from already-loaded credentials. An empty list is a
    /// configuration fault.
    pub fn new(credentials: Vec<Credential>) -> GatewayResult<Self> {
        if credentials.is_empty() {
            return Err(config_error!("credentials list is empty", "credentials"));
        }

        if let Some(blank) = credentials.iter().find(|c| c.username.is_empty()) {
            return Err(config_error!(
                format!("credential entry has an empty username: {:?}", blank),
                "credentials"
            ));
        }

        Ok(Self { credentials })
    }

    /// Load the JSON credentials file. Missing, malformed or empty files are
    /// configuration faults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GatewayError::Config {
            message: format!("Failed to read credentials file {}: {}", path.display(), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("credentials")
                .with_operation("read_file")
                .with_suggestion(
                    "Create it with [{ \"username\": \"admin\", \"password\": \"secret\" }]",
                ),
        })?;

        let store = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            users = store.len(),
            "Credentials loaded"
        );
        Ok(store)
    }

    pub fn from_json_str(content: &str) -> GatewayResult<Self> {
        let file: CredentialFile =
            serde_json::from_str(content).map_err(|e| GatewayError::Config {
                message: format!("Failed to parse credentials: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("credentials")
                    .with_operation("parse_json")
                    .with_suggestion("Expect an array of {\"username\", \"password\"} objects"),
            })?;

        match file {
            CredentialFile::Many(credentials) => Self::new(credentials),
            CredentialFile::Single(credential) => Self::new(vec![credential]),
        }
    }

    /// Linear scan with exact plaintext comparison.
    pub fn verify(&self, username: &str, password: &str) -> Option<&Credential> {
        self.credentials
            .iter()
            .find(|c| c.username == username && c.password == password)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
