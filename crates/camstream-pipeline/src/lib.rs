//! # camstream-pipeline
//!
//! Per-device capture pipeline and process-wide pipeline registry built
//! on top of `camstream-v4l2`. A pipeline owns one `Device`, runs a
//! producer thread that queues/awaits/dequeues buffers and a consumer
//! thread that fans each captured frame out to registered listeners.
//!
//! # Example
//!
//! ```rust,ignore
//! use camstream_pipeline::{Listener, PipelineConfig, Registry};
//! use std::sync::Arc;
//!
//! let registry = Registry::new();
//! let config = PipelineConfig::builder("front", "/dev/video0").build();
//! registry.start(config)?;
//!
//! registry.register_listener(
//!     "front",
//!     Listener::new("recorder", Arc::new(|frame: &camstream_pipeline::Frame| {
//!         println!("got {} bytes", frame.length);
//!     })),
//! )?;
//!
//! registry.stop("front")?;
//! # Ok::<(), camstream_pipeline::PipelineError>(())
//! ```

pub mod error;
pub mod listener;
pub mod pipeline;
pub mod registry;
pub mod types;

pub use error::{PipelineError, Result};
pub use listener::{FrameCallback, Listener};
pub use pipeline::Pipeline;
pub use registry::Registry;
pub use types::{
    AwaitMode, Frame, PipelineConfig, PipelineConfigBuilder, VideoArea, NON_BLOCKING_POLL_TIMEOUT,
};

#[cfg(test)]
mod tests {
    #[test]
    fn test_public_reexports_compile() {
        let _ = crate::Registry::new();
    }
}
