//! Error types for worker task operations.

use thiserror::Error;

/// Errors that can occur while creating or stopping a [`crate::WorkerTask`].
#[derive(Error, Debug)]
pub enum TaskError {
    /// The underlying OS thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),

    /// A scheduling priority could not be applied to the thread.
    #[error("failed to set thread priority: {0}")]
    PriorityFailed(String),
}

/// Result type for worker task operations.
pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    pub(crate) fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }

    pub(crate) fn priority_failed(msg: impl Into<String>) -> Self {
        Self::PriorityFailed(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaskError::spawn_failed("out of threads");
        assert_eq!(
            err.to_string(),
            "failed to spawn worker thread: out of threads"
        );
    }
}
