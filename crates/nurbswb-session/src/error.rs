//! Error types for edit sessions.

use nurbswb_kernel::NurbsError;
use thiserror::Error;

/// Errors raised while executing a session command.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The grid or surface rejected the edit.
    #[error(transparent)]
    Kernel(#[from] NurbsError),

    /// The command needs a selected pole and none is set.
    #[error("no pole selected")]
    NoSelection,
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
