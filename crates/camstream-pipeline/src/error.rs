//! Error types for the capture pipeline and its registry.

use thiserror::Error;

/// Errors that can occur while starting, stopping, or driving a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A device with this name is already capturing.
    #[error("pipeline '{0}' is already running")]
    AlreadyRunning(String),

    /// No running pipeline matches the requested name.
    #[error("no such pipeline: {0}")]
    NotFound(String),

    /// A listener registration was rejected (missing name or callback).
    #[error("invalid listener: {0}")]
    BadListener(String),

    /// The underlying V4L2 device failed.
    #[error("device error: {0}")]
    Device(#[from] camstream_v4l2::V4l2Error),

    /// A worker task failed to start or stop.
    #[error("task error: {0}")]
    Task(#[from] camstream_task::TaskError),

    /// The listener or pipeline registry could not be locked or walked.
    #[error("registry error: {0}")]
    Registry(#[from] camstream_container::ContainerError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::AlreadyRunning("front".into());
        assert_eq!(err.to_string(), "pipeline 'front' is already running");

        let err = PipelineError::NotFound("back".into());
        assert_eq!(err.to_string(), "no such pipeline: back");
    }

    #[test]
    fn test_device_error_conversion() {
        let err: PipelineError = camstream_v4l2::V4l2Error::Timeout.into();
        assert!(matches!(err, PipelineError::Device(_)));
    }
}
