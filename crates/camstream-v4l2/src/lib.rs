//! # camstream-v4l2
//!
//! Thin, safe-at-the-edges wrapper over the V4L2 capture ioctls: opening a
//! device, negotiating format and frame rate, clamping crop/compose
//! rectangles, allocating `mmap` or user-pointer buffers, and driving the
//! queue/dequeue/streamon/streamoff cycle.
//!
//! This crate deliberately stays at the single-device level; fanning a
//! device's frames out to multiple listeners is `camstream-pipeline`'s job.
//!
//! # Example
//!
//! ```rust,ignore
//! use camstream_v4l2::{Capabilities, ConfigureParams, Device, Memory};
//!
//! let device = Device::open("/dev/video0", Capabilities::VIDEO_CAPTURE)?;
//! device.configure(&ConfigureParams {
//!     width: 1280,
//!     height: 720,
//!     pixelformat: 0x5655_5949, // YUYV fourcc
//!     colorspace: 8,
//!     desired_fps: 30,
//! })?;
//! device.request_buffers(4, Memory::Mmap)?;
//! device.start_capture()?;
//! # Ok::<(), camstream_v4l2::V4l2Error>(())
//! ```

pub mod buffer;
pub mod device;
pub mod error;
pub mod sys;
pub mod types;

pub use buffer::BufferSlot;
pub use device::{Device, MAX_AWAIT_TIMEOUT};
pub use error::{Result, V4l2Error};
pub use types::{
    AwaitOutcome, Capabilities, ConfigureParams, DeviceCapabilities, Format, Memory, SelectionRect,
};

#[cfg(test)]
mod tests {
    #[test]
    fn test_public_reexports_compile() {
        let _ = crate::Capabilities::VIDEO_CAPTURE;
        let _ = crate::Memory::Mmap;
    }
}
