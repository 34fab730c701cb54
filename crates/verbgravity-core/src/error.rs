//! Collaborator error types.
//!
//! Failures of the analysis, session, and progress collaborators. Defined in
//! `verbgravity-core` so the session driver and the CLI can classify errors
//! without string matching.

use thiserror::Error;

/// Errors returned by a backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The requested session does not exist.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not what we expected.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Returns `true` for failures a later attempt could plausibly fix.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout(_) | BackendError::Network(_) => true,
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::NotFound(_) | BackendError::Decode(_) => false,
        }
    }
}
