//! Public configuration and data types for the capture pipeline.

use std::time::Duration;

use camstream_task::Priority;
use camstream_v4l2::{ConfigureParams, Memory, SelectionRect};

/// Whether `Pipeline`'s frame producer blocks indefinitely on new data or
/// polls with a bounded timeout, yielding control back to the quit check
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AwaitMode {
    /// Block on the device fd with no timeout.
    #[default]
    Blocking,
    /// Poll with a two-second ceiling, re-checking the shutdown flag
    /// between attempts.
    NonBlocking,
}

/// A frame captured from a device, handed to every registered listener.
///
/// `data` is a single buffer the pipeline allocates once, to the
/// device's maximum buffer size, and overwrites in place on every
/// capture: listeners are notified while the pipeline holds the lock
/// guarding this struct, so there is never more than one reader and no
/// per-frame allocation. `data.len()` may be smaller than its capacity;
/// `length` is the count of bytes actually captured into it.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub index: u32,
    pub length: usize,
    pub offset: u32,
    pub data: Vec<u8>,
}

/// Width/height of the negotiated capture area, after crop/compose
/// negotiation has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoArea {
    pub width: u32,
    pub height: u32,
}

/// Parameters needed to start capturing on one device.
#[derive(Clone)]
pub struct PipelineConfig {
    pub name: String,
    pub path: String,
    pub configure: ConfigureParams,
    pub cropping_area: SelectionRect,
    pub composing_area: SelectionRect,
    pub buffer_count: u32,
    pub memory: Memory,
    pub await_mode: AwaitMode,
    pub priority: Priority,
}

impl PipelineConfig {
    pub fn builder(name: impl Into<String>, path: impl Into<String>) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(name, path)
    }
}

/// Builder for [`PipelineConfig`], following the crate's convention of
/// defaulting every field that has a sane default and only requiring the
/// device's name and path up front.
pub struct PipelineConfigBuilder {
    name: String,
    path: String,
    configure: ConfigureParams,
    cropping_area: SelectionRect,
    composing_area: SelectionRect,
    buffer_count: u32,
    memory: Memory,
    await_mode: AwaitMode,
    priority: Priority,
}

impl PipelineConfigBuilder {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            configure: ConfigureParams {
                width: 640,
                height: 480,
                pixelformat: 0,
                colorspace: 0,
                desired_fps: 30,
            },
            cropping_area: SelectionRect::default(),
            composing_area: SelectionRect::default(),
            buffer_count: 4,
            memory: Memory::Mmap,
            await_mode: AwaitMode::Blocking,
            priority: Priority::default(),
        }
    }

    pub fn configure(mut self, configure: ConfigureParams) -> Self {
        self.configure = configure;
        self
    }

    pub fn cropping_area(mut self, rect: SelectionRect) -> Self {
        self.cropping_area = rect;
        self
    }

    pub fn composing_area(mut self, rect: SelectionRect) -> Self {
        self.composing_area = rect;
        self
    }

    pub fn buffer_count(mut self, count: u32) -> Self {
        self.buffer_count = count;
        self
    }

    pub fn memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    pub fn await_mode(mut self, mode: AwaitMode) -> Self {
        self.await_mode = mode;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn build(self) -> PipelineConfig {
        PipelineConfig {
            name: self.name,
            path: self.path,
            configure: self.configure,
            cropping_area: self.cropping_area,
            composing_area: self.composing_area,
            buffer_count: self.buffer_count,
            memory: self.memory,
            await_mode: self.await_mode,
            priority: self.priority,
        }
    }
}

/// The await-data polling ceiling used in `AwaitMode::NonBlocking`.
pub const NON_BLOCKING_POLL_TIMEOUT: Duration = Duration::from_secs(2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder("front", "/dev/video0").build();
        assert_eq!(config.name, "front");
        assert_eq!(config.buffer_count, 4);
        assert_eq!(config.memory, Memory::Mmap);
        assert_eq!(config.await_mode, AwaitMode::Blocking);
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder("back", "/dev/video1")
            .buffer_count(8)
            .memory(Memory::UserPtr)
            .await_mode(AwaitMode::NonBlocking)
            .build();
        assert_eq!(config.buffer_count, 8);
        assert_eq!(config.memory, Memory::UserPtr);
        assert_eq!(config.await_mode, AwaitMode::NonBlocking);
    }
}
