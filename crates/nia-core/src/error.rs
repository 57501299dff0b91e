//! Error types for the Nia child session core.

use thiserror::Error;

/// A shared error type for the entire Nia workspace.
///
/// Variants are grouped by the failure classes a child session can run into:
/// input validation, authentication state, single-flight refusals and remote
/// service failures. None of them is fatal; every caller can recover into a
/// retryable state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NiaError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A versioned record could not be migrated to the current schema
    #[error("Migration error: {0}")]
    Migration(String),

    /// Input rejected before any state mutation or network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// No child session is active
    #[error("No child is signed in")]
    NotAuthenticated,

    /// The active session belongs to a different child than the caller expects
    #[error("Session belongs to child '{actual}', expected '{expected}'")]
    SessionMismatch { expected: String, actual: String },

    /// A single-flight operation is already in progress
    #[error("Operation already in progress: {0}")]
    Busy(&'static str),

    /// A remote collaborator answered with an error or could not be reached
    #[error("{service} service error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Service {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// A remote call exceeded its bounded timeout
    #[error("{service} service timed out after {after_ms}ms")]
    Timeout { service: &'static str, after_ms: u64 },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NiaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Service error
    pub fn service(service: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            status,
            message: message.into(),
        }
    }

    /// Creates a Timeout error
    pub fn timeout(service: &'static str, after: std::time::Duration) -> Self {
        Self::Timeout {
            service,
            after_ms: u64::try_from(after.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a single-flight refusal
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// Check if this error means no (or the wrong) child is signed in
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::SessionMismatch { .. })
    }

    /// Check if the failure came from a remote collaborator.
    ///
    /// Returns true for `Service` and `Timeout` errors. These are the failures
    /// that a user can retry by re-invoking the operation.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Service { .. } | Self::Timeout { .. })
    }

    /// HTTP status carried by a `Service` error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => *status,
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for NiaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for NiaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for NiaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for NiaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for NiaError {
    fn from(err: version_migrate::MigrationError) -> Self {
        use version_migrate::MigrationError;

        match err {
            MigrationError::EntityNotFound(id) => Self::not_found("entity", id),
            MigrationError::DeserializationError(_) | MigrationError::SerializationError(_) => {
                Self::Serialization {
                    format: "migration".to_string(),
                    message: err.to_string(),
                }
            }
            MigrationError::TomlParseError(_) | MigrationError::TomlSerializeError(_) => {
                Self::Serialization {
                    format: "TOML".to_string(),
                    message: err.to_string(),
                }
            }
            MigrationError::IoError { .. } => Self::Io {
                message: err.to_string(),
            },
            _ => Self::Migration(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for NiaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, NiaError>`.
pub type Result<T> = std::result::Result<T, NiaError>;
