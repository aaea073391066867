//! Unified error handling system
//!
//! Provides the typed failures of the gateway: authentication results, content
//! store failures and fatal configuration faults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type GatewayResult<T> = Result<T, GatewayError>;
pub type StorageResult<T> = Result<T, StorageError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Negative outcome of a login attempt.
///
/// This is a normal result, not a fault: the HTTP layer decides whether it
/// becomes a 401 body or a re-rendered login page.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Typed failure of a single content store operation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to write object '{key}'")]
    WriteFailed {
        key: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("failed to list objects")]
    ListFailed {
        #[source]
        source: Option<BoxError>,
    },

    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("failed to read object '{key}'")]
    ReadFailed {
        key: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("failed to delete object '{key}'")]
    DeleteFailed {
        key: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl StorageError {
    pub fn write_failed<E>(key: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        StorageError::WriteFailed {
            key: key.to_string(),
            source: Some(source.into()),
        }
    }

    pub fn list_failed<E>(source: E) -> Self
    where
        E: Into<BoxError>,
    {
        StorageError::ListFailed {
            source: Some(source.into()),
        }
    }

    pub fn read_failed<E>(key: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        StorageError::ReadFailed {
            key: key.to_string(),
            source: Some(source.into()),
        }
    }

    pub fn delete_failed<E>(key: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        StorageError::DeleteFailed {
            key: key.to_string(),
            source: Some(source.into()),
        }
    }

    pub fn not_found(key: &str) -> Self {
        StorageError::NotFound {
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Short machine-friendly name of the failed operation, used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            StorageError::WriteFailed { .. } => "put_object",
            StorageError::ListFailed { .. } => "list_objects",
            StorageError::NotFound { .. } | StorageError::ReadFailed { .. } => "get_object",
            StorageError::DeleteFailed { .. } => "delete_object",
        }
    }
}

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxError>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GatewayError::Config { context, .. } => Some(context),
            GatewayError::Validation { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Configuration faults abort startup; everything else is per request.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GatewayError::Config { .. } | GatewayError::Validation { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            GatewayError::Config { .. } | GatewayError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    suggestions = ?self.context().map(|c| &c.recovery_suggestions),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            GatewayError::Auth(_) => {
                warn!(error = %self, "Authentication rejected");
            }
            _ => {
                error!(error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GatewayError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GatewayError::Config {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GatewayError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}
