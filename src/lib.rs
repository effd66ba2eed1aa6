//! # camstream
//!
//! V4L2 video capture and fan-out streaming for Rust.
//!
//! This crate provides a unified interface to the camstream libraries:
//!
//! - **[`container`]** - Mutex-protected ordered container used by the
//!   registry and listener lists.
//! - **[`task`]** - Named, priority-aware worker thread built on
//!   `SCHED_FIFO` and a semaphore-based start/quit gate.
//! - **[`v4l2`]** - Raw V4L2 device wrapper: format/crop/compose
//!   negotiation, `mmap`/user-pointer buffers, queue/dequeue/streamon.
//! - **[`pipeline`]** - Per-device capture pipeline and the process-wide
//!   pipeline registry, built on top of `v4l2`.
//!
//! # Features
//!
//! All features are enabled by default. You can selectively enable only what you need:
//!
//! ```toml
//! # Use everything (default)
//! camstream = "0.1"
//!
//! # v4l2 only
//! camstream = { version = "0.1", default-features = false, features = ["v4l2"] }
//!
//! # v4l2 + pipeline
//! camstream = { version = "0.1", default-features = false, features = ["v4l2", "pipeline"] }
//! ```
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `container` | Yes | Mutex-protected ordered container |
//! | `task` | Yes | Named, priority-aware worker thread |
//! | `v4l2` | Yes | Raw V4L2 device wrapper |
//! | `pipeline` | Yes | Capture pipeline and device registry |
//! | `full` | No | All features from all sub-crates |
//!
//! # Quick Start
//!
//! ## Capturing one device
//!
//! ```rust,ignore
//! use camstream::v4l2::{Capabilities, ConfigureParams, Device, Memory};
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
//! # Ok::<(), camstream::v4l2::V4l2Error>(())
//! ```
//!
//! ## Full Pipeline: Device → Registry → Listeners
//!
//! ```rust,ignore
//! use camstream::pipeline::{Listener, PipelineConfig, Registry};
//! use std::sync::Arc;
//!
//! let registry = Registry::new();
//! let config = PipelineConfig::builder("front", "/dev/video0").build();
//! let pipeline = registry.start(config)?;
//!
//! registry.register_listener(
//!     "front",
//!     Listener::new("recorder", Arc::new(|frame: &camstream::pipeline::Frame| {
//!         println!("got {} bytes", frame.length);
//!     })),
//! )?;
//!
//! registry.stop("front")?;
//! # Ok::<(), camstream::pipeline::PipelineError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           camstream                              │
//! ├──────────────────┬──────────────────┬─────────────────────────┤
//! │ camstream-container │  camstream-task  │      camstream-v4l2     │
//! │                  │                  │                         │
//! │  OrderedList     │  WorkerTask      │  Device                 │
//! │                  │  Semaphore       │  BufferSlot             │
//! │                  │  Priority        │  ConfigureParams        │
//! └──────────────────┴──────────────────┴────────────┬────────────┘
//!                                                     │
//!                                                     ▼
//!                                          camstream-pipeline
//!                                          Pipeline, Registry, Listener
//! ```
//!
//! # Platform Support
//!
//! - **Linux only** - Requires a V4L2 capture device (`/dev/videoN`).
//!
//! # Related Crates
//!
//! You can also use the individual crates directly:
//!
//! - [`camstream-container`](https://crates.io/crates/camstream-container)
//! - [`camstream-task`](https://crates.io/crates/camstream-task)
//! - [`camstream-v4l2`](https://crates.io/crates/camstream-v4l2)
//! - [`camstream-pipeline`](https://crates.io/crates/camstream-pipeline)

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// RE-EXPORTS
// =============================================================================

/// Mutex-protected ordered container used by the registry and listener lists.
///
/// See [`camstream_container`] documentation for details.
#[cfg(feature = "container")]
#[cfg_attr(docsrs, doc(cfg(feature = "container")))]
pub use camstream_container as container;

/// Named, priority-aware worker thread.
///
/// This module provides the building blocks worker loops are made of:
/// - `WorkerTask`, a thread driven by a repeatedly-invoked iteration closure
/// - `Semaphore`, a counting semaphore used for start/quit gating
/// - `Priority`, `SCHED_FIFO` priority classes for capture threads
///
/// See [`camstream_task`] documentation for details.
#[cfg(feature = "task")]
#[cfg_attr(docsrs, doc(cfg(feature = "task")))]
pub use camstream_task as task;

/// Raw V4L2 device wrapper.
///
/// This module provides access to a single capture device:
/// - Format, frame rate, crop and compose negotiation
/// - `mmap` and user-pointer buffer allocation
/// - The queue/await/dequeue/streamon/streamoff cycle
///
/// See [`camstream_v4l2`] documentation for details.
#[cfg(feature = "v4l2")]
#[cfg_attr(docsrs, doc(cfg(feature = "v4l2")))]
pub use camstream_v4l2 as v4l2;

/// Per-device capture pipeline and the process-wide pipeline registry.
///
/// This module provides the fan-out layer on top of `v4l2`:
/// - Producer/consumer worker pair driving the capture loop
/// - Listener registration and notification
/// - A registry tracking every running pipeline by name
///
/// See [`camstream_pipeline`] documentation for details.
#[cfg(feature = "pipeline")]
#[cfg_attr(docsrs, doc(cfg(feature = "pipeline")))]
pub use camstream_pipeline as pipeline;

// =============================================================================
// PRELUDE - Common types for convenience
// =============================================================================

/// Prelude module with commonly used types.
///
/// ```rust
/// use camstream::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "container")]
    pub use camstream_container::{ContainerError, OrderedList};

    #[cfg(feature = "task")]
    pub use camstream_task::{Priority, Semaphore, TaskError, WorkerTask};

    #[cfg(feature = "v4l2")]
    pub use camstream_v4l2::{Capabilities, ConfigureParams, Device, Memory, V4l2Error};

    #[cfg(feature = "pipeline")]
    pub use camstream_pipeline::{
        Frame, Listener, Pipeline, PipelineConfig, PipelineError, Registry,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    #[cfg(feature = "container")]
    fn test_container_reexport() {
        let _ = container::OrderedList::<u32>::new();
    }

    #[test]
    #[cfg(feature = "task")]
    fn test_task_reexport() {
        let _ = task::Priority::default();
    }

    #[test]
    #[cfg(feature = "v4l2")]
    fn test_v4l2_reexport() {
        let _ = v4l2::Capabilities::VIDEO_CAPTURE;
    }

    #[test]
    #[cfg(feature = "pipeline")]
    fn test_pipeline_reexport() {
        let _ = pipeline::Registry::new();
    }
}
