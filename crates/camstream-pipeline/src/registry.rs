//! Process-wide registry of running pipelines, keyed by device name.

use std::sync::Arc;

use camstream_container::OrderedList;

use crate::error::{PipelineError, Result};
use crate::listener::Listener;
use crate::pipeline::Pipeline;
use crate::types::{PipelineConfig, VideoArea};

/// Tracks every currently-running [`Pipeline`], analogous to the
/// original's process-wide list of video contexts.
///
/// A process typically keeps exactly one `Registry` alive for its
/// lifetime, shared via `Arc` between whatever owns device lifecycle and
/// whatever registers listeners.
#[derive(Default)]
pub struct Registry {
    pipelines: OrderedList<Arc<Pipeline>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            pipelines: OrderedList::new(),
        }
    }

    /// Starts a new pipeline for `config.name` and adds it to the
    /// registry. Fails with `AlreadyRunning` if that name is already
    /// registered, mirroring `startDeviceCapture_f`'s existence check.
    pub fn start(&self, config: PipelineConfig) -> Result<Arc<Pipeline>> {
        let name = config.name.clone();

        if self.find(&name).is_some() {
            return Err(PipelineError::AlreadyRunning(name));
        }

        let pipeline = Pipeline::start(config)?;
        self.pipelines.add(pipeline.clone());
        Ok(pipeline)
    }

    /// Stops and removes the named pipeline.
    pub fn stop(&self, name: &str) -> Result<()> {
        let pipeline = self
            .find(name)
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))?;

        pipeline.stop()?;
        self.pipelines.remove_where(|p| p.name() == name);
        Ok(())
    }

    pub fn register_listener(&self, name: &str, listener: Listener) -> Result<()> {
        self.find(name)
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))?
            .register_listener(listener)
    }

    pub fn unregister_listener(&self, name: &str, listener_name: &str) -> Result<()> {
        self.find(name)
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))?
            .unregister_listener(listener_name)
    }

    pub fn final_video_area(&self, name: &str) -> Result<VideoArea> {
        Ok(self
            .find(name)
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))?
            .final_video_area())
    }

    pub fn max_buffer_size(&self, name: &str) -> Result<usize> {
        Ok(self
            .find(name)
            .ok_or_else(|| PipelineError::NotFound(name.to_string()))?
            .max_buffer_size())
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    fn find(&self, name: &str) -> Option<Arc<Pipeline>> {
        self.pipelines.lock().iter().find(|p| p.name() == name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_stop_unknown_pipeline_errors() {
        let registry = Registry::new();
        let err = registry.stop("nonexistent").unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn test_register_listener_on_unknown_pipeline_errors() {
        let registry = Registry::new();
        let listener = Listener::new("observer", std::sync::Arc::new(|_: &crate::types::Frame| {}));
        let err = registry.register_listener("nonexistent", listener).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }
}
