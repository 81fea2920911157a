//! The narrow error surface of the scroll core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrollError {
    /// Persisted state could not be decoded.
    #[error("invalid persisted scroll state: {0}")]
    PersistDecode(#[from] serde_json::Error),

    /// A layout handler failed during placement; the controller is
    /// reverted to the empty state.
    #[error("slice handler failed: {0}")]
    HandlerFailed(String),
}
