//! Store error types.

use thiserror::Error;

/// Errors that can occur when talking to a specification store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The specification does not exist.
    #[error("specification {0} not found")]
    NotFound(u64),

    /// The credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// A stored snapshot could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}
