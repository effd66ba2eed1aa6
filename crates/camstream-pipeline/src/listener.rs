//! Frame listener registration.

use std::sync::Arc;

use crate::types::Frame;

/// A callback invoked with each newly captured frame.
///
/// Per the capture loop's contract, callbacks must return quickly: they
/// run on the notifier thread while holding the pipeline's buffer lock,
/// so a slow listener stalls every other listener and the next frame's
/// capture.
pub trait FrameCallback: Send + Sync {
    fn on_frame(&self, frame: &Frame);
}

impl<F> FrameCallback for F
where
    F: Fn(&Frame) + Send + Sync,
{
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

/// A named subscriber to a pipeline's frames.
#[derive(Clone)]
pub struct Listener {
    pub name: String,
    callback: Arc<dyn FrameCallback>,
}

impl Listener {
    pub fn new(name: impl Into<String>, callback: Arc<dyn FrameCallback>) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }

    pub fn notify(&self, frame: &Frame) {
        self.callback.on_frame(frame);
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_listener_notify_invokes_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let listener = Listener::new(
            "test",
            Arc::new(move |_: &Frame| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let frame = Frame {
            index: 0,
            length: 0,
            offset: 0,
            data: Vec::new(),
        };
        listener.notify(&frame);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
