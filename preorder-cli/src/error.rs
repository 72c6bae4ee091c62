//! Error taxonomy for a sync run
//!
//! Every failure is fatal to the run. The variants exist so the caller can
//! tell a bad input file from a bad remote call without string matching.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Input file missing, unreadable, or not a spreadsheet we can open
    #[error("Cannot read input file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Expected columns are absent from the header row
    #[error("Input file {} is missing required column(s): {}", .path.display(), .missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    /// Network, auth, query or decode failure talking to the product store
    #[error("{operation} failed{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    RemoteOperation {
        operation: String,
        status: Option<u16>,
        message: String,
        transient: bool,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn file_access(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::FileAccess {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a remote error from an HTTP status, classifying 429 and 5xx as transient
    pub fn from_status(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            status: Some(status),
            message: message.into(),
            transient: status == 429 || status >= 500,
        }
    }

    /// Build a remote error from a transport failure (connect, timeout, body read)
    pub fn from_transport(operation: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
            transient: err.is_connect() || err.is_timeout() || err.is_request(),
        }
    }

    /// Build a remote error for a response we received but could not interpret
    pub fn decode(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            status: None,
            message: message.into(),
            transient: false,
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteOperation { transient: true, .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
