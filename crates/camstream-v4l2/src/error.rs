//! Error types for V4L2 device operations.

use thiserror::Error;

/// Errors that can occur while driving a [`crate::Device`].
///
/// Mirrors the original `v4l2_error_e` taxonomy; `V4L2_ERROR_NONE` has no
/// counterpart here since success is represented by `Ok(())`.
#[derive(Error, Debug)]
pub enum V4l2Error {
    /// An ioctl, `open`, `mmap`, or pipe syscall failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-supplied parameter was rejected by the driver or is
    /// otherwise invalid (e.g. the selection API is unsupported).
    #[error("invalid parameters: {0}")]
    ParamsError(String),

    /// Buffer allocation or mapping failed, or the kernel granted fewer
    /// buffers than requested.
    #[error("memory error: {0}")]
    Memory(String),

    /// A capture operation (start/stop/queue/dequeue) failed.
    #[error("capture error: {0}")]
    CaptureError(String),

    /// `await_data` exceeded its timeout with no event.
    #[error("timed out waiting for data")]
    Timeout,

    /// The requested device path does not exist or cannot be opened.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The device does not support the capabilities the caller required.
    #[error("device lacks required capabilities")]
    BadCaps,
}

/// Result type for V4L2 device operations.
pub type Result<T> = std::result::Result<T, V4l2Error>;

impl V4l2Error {
    pub(crate) fn params(msg: impl Into<String>) -> Self {
        Self::ParamsError(msg.into())
    }

    pub(crate) fn memory(msg: impl Into<String>) -> Self {
        Self::Memory(msg.into())
    }

    pub(crate) fn capture(msg: impl Into<String>) -> Self {
        Self::CaptureError(msg.into())
    }

    pub(crate) fn unknown_device(msg: impl Into<String>) -> Self {
        Self::UnknownDevice(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = V4l2Error::Timeout;
        assert_eq!(err.to_string(), "timed out waiting for data");

        let err = V4l2Error::memory("kernel granted 2 of 4 buffers");
        assert_eq!(err.to_string(), "memory error: kernel granted 2 of 4 buffers");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err: V4l2Error = io_err.into();
        assert!(matches!(err, V4l2Error::Io(_)));
    }
}
