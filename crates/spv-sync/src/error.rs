//! Sync error types.

use thiserror::Error;

/// Errors reported by the syncer and sender collaborators, and by event
/// subscription.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Relayed transaction could not be stored.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Collaborator failure outside storage.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Event subscription attempted outside a tokio runtime.
    #[error("No tokio runtime: {0}")]
    NoRuntime(String),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
