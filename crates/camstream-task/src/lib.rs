//! Named, priority-aware worker thread with start/quit gating.
//!
//! `camstream-task` provides [`WorkerTask`], a small wrapper around
//! `std::thread` that:
//!
//! - names the underlying OS thread,
//! - optionally requests a `SCHED_FIFO` priority class via [`Priority`],
//! - blocks the thread on a start gate until [`WorkerTask::start`] is
//!   called, and
//! - runs a caller-supplied closure repeatedly until
//!   [`WorkerTask::stop`] signals a quit gate.
//!
//! [`Semaphore`] is the counting semaphore the rest of the workspace uses
//! wherever the original relies on a POSIX `sem_t` (the video pipeline's
//! producer/consumer handoff, in particular).
//!
//! # Examples
//!
//! ```
//! use camstream_task::{Priority, WorkerTask};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let ticks = Arc::new(AtomicUsize::new(0));
//! let ticks_clone = Arc::clone(&ticks);
//!
//! let task = WorkerTask::spawn("demo", Priority::Default, move || {
//!     ticks_clone.fetch_add(1, Ordering::SeqCst);
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }, None::<fn()>).unwrap();
//!
//! task.start();
//! std::thread::sleep(std::time::Duration::from_millis(10));
//! task.stop();
//!
//! assert!(ticks.load(Ordering::SeqCst) > 0);
//! ```

pub mod error;
pub mod priority;
pub mod semaphore;
pub mod task;

pub use error::{Result, TaskError};
pub use priority::Priority;
pub use semaphore::Semaphore;
pub use task::WorkerTask;
