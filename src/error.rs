//! Error types for hostlink
//!
//! Provides a unified error type for all operations.
//!
//! Only `Transport` errors are ever retried by the request executor; every
//! other kind surfaces on first occurrence.

use thiserror::Error;

/// Result type alias using HostlinkError
pub type Result<T> = std::result::Result<T, HostlinkError>;

/// Unified error type for hostlink operations
#[derive(Debug, Error)]
pub enum HostlinkError {
    // -------------------------------------------------------------------------
    // Transport Errors (retryable)
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors (never retried - version mismatch or server defect)
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    // -------------------------------------------------------------------------
    // Server-Reported Errors
    // -------------------------------------------------------------------------
    #[error("Server error {code}: {message}")]
    Application { code: i32, message: String },

    // -------------------------------------------------------------------------
    // Cache Errors
    // -------------------------------------------------------------------------
    #[error("Cache consistency violation: {0}")]
    Consistency(String),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Cancellation
    // -------------------------------------------------------------------------
    #[error("Request cancelled")]
    Cancelled,
}

impl HostlinkError {
    /// Whether the request executor may retry after this error
    ///
    /// Only transport-level failures are transient; everything else is either
    /// a server-validated outcome, a local defect, or a cancellation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HostlinkError::Transport(_))
    }
}
