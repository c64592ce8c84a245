//! Provisioning errors.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A single store call that did not succeed.
///
/// Captured per item and reported; never aborts a run on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Table '{table}' not visible after {attempts} attempts")]
    VisibilityTimeout { table: String, attempts: u32 },
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

/// Conditions that stop a run before anything is created.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("No credential available: {0}")]
    MissingCredential(String),

    #[error("Store unreachable: {0}")]
    Unreachable(StoreError),

    #[error("No publisher found with customization prefix '{prefix}'")]
    PublisherNotFound { prefix: String },

    /// The publisher lookup itself failed.
    #[error("Publisher lookup failed: {0}")]
    PublisherLookup(StoreError),

    #[error("Invalid environment configuration: {0}")]
    Configuration(String),
}

impl From<crate::config::SettingsError> for PreconditionError {
    fn from(err: crate::config::SettingsError) -> Self {
        PreconditionError::Configuration(err.to_string())
    }
}
