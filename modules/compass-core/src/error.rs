//! Typed errors for fetching and parsing Compass pages.

use thiserror::Error;

/// Errors that can occur while fetching or parsing portal data.
#[derive(Debug, Error)]
pub enum CompassError {
    /// The page redirected its form to the access-denied sentinel.
    #[error("You do not have permission to the details of {identifier}")]
    PermissionDenied { identifier: String },

    /// A raw value could not be coerced to the expected type.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A record could not be built from the extracted fields.
    #[error("Parsing Error! {id_name}: {id}: {message}")]
    Validation {
        id_name: &'static str,
        id: u64,
        message: String,
    },

    /// The requested member profile tab does not exist.
    #[error("Specified member profile tab {0} is invalid")]
    InvalidTab(String),

    /// The hierarchy member search returned its error page.
    #[error("Invalid Search")]
    InvalidSearch,

    /// The HTTP collaborator failed.
    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CompassError {
    pub fn permission_denied(identifier: impl std::fmt::Display) -> Self {
        CompassError::PermissionDenied {
            identifier: identifier.to_string(),
        }
    }

    pub fn member(id: u64, message: impl Into<String>) -> Self {
        CompassError::Validation {
            id_name: "Membership Number",
            id,
            message: message.into(),
        }
    }

    pub fn role(id: u64, message: impl Into<String>) -> Self {
        CompassError::Validation {
            id_name: "Role Number",
            id,
            message: message.into(),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, CompassError::PermissionDenied { .. })
    }
}

/// Result type alias for Compass operations.
pub type Result<T> = std::result::Result<T, CompassError>;
