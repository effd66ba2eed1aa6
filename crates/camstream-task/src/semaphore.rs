//! A small counting semaphore.
//!
//! The original task and video modules are built around POSIX `sem_t`:
//! one pair gates a worker thread's start/quit, another wakes the video
//! pipeline's notifier thread. Rust has no counting semaphore in `std`, so
//! this one is built directly on `parking_lot::{Mutex, Condvar}`, which the
//! rest of the workspace already depends on.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// A counting semaphore: [`Semaphore::post`] increments the count and wakes
/// one waiter; [`Semaphore::wait`] blocks until the count is positive, then
/// decrements it.
#[derive(Debug)]
pub struct Semaphore {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with the given initial count.
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            condvar: Condvar::new(),
        }
    }

    /// Increments the count and wakes one waiter, if any are blocked.
    pub fn post(&self) {
        let mut count = self.count.lock();
        *count += 1;
        self.condvar.notify_one();
    }

    /// Blocks until the count is positive, then decrements it.
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count == 0 {
            self.condvar.wait(&mut count);
        }
        *count -= 1;
    }

    /// Decrements the count without blocking if it is already positive.
    ///
    /// Returns `true` if the count was decremented, `false` if it was
    /// already zero. This is the Rust equivalent of `sem_trywait`, used by
    /// the worker loop to check the quit gate without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Blocks until the count is positive or `timeout` elapses.
    ///
    /// Returns `true` if the semaphore was acquired, `false` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            return true;
        }
        let result = self.condvar.wait_for(&mut count, timeout);
        if !result.timed_out() && *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_post_then_wait_does_not_block() {
        let sem = Semaphore::new(0);
        sem.post();
        sem.wait();
    }

    #[test]
    fn test_try_acquire_on_empty() {
        let sem = Semaphore::new(0);
        assert!(!sem.try_acquire());
    }

    #[test]
    fn test_try_acquire_after_post() {
        let sem = Semaphore::new(0);
        sem.post();
        assert!(sem.try_acquire());
        assert!(!sem.try_acquire());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let sem = Semaphore::new(0);
        let acquired = sem.wait_timeout(Duration::from_millis(20));
        assert!(!acquired);
    }

    #[test]
    fn test_cross_thread_wakeup() {
        let sem = Arc::new(Semaphore::new(0));
        let sem2 = Arc::clone(&sem);

        let handle = thread::spawn(move || {
            sem2.wait();
        });

        thread::sleep(Duration::from_millis(20));
        sem.post();
        handle.join().unwrap();
    }

    #[test]
    fn test_initial_count_available_immediately() {
        let sem = Semaphore::new(1);
        assert!(sem.try_acquire());
    }
}
