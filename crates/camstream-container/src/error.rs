//! Error types for container operations
//!
//! Provides typed errors that library users can match and handle specifically.

use thiserror::Error;

/// Errors that can occur while operating on an [`crate::OrderedList`].
///
/// # Examples
///
/// ```
/// use camstream_container::{ContainerError, OrderedList};
///
/// let list: OrderedList<u32> = OrderedList::new();
/// list.add(1);
/// assert_eq!(list.len(), 1);
/// ```
#[derive(Error, Debug)]
pub enum ContainerError {
    /// The internal mutex was poisoned by a panicking holder.
    ///
    /// `OrderedList` uses `parking_lot::Mutex`, which never poisons, so this
    /// variant only ever appears if a future change reintroduces a
    /// std-library mutex somewhere in the call path.
    #[error("container lock unavailable")]
    Lock,
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContainerError::Lock;
        assert_eq!(err.to_string(), "container lock unavailable");
    }
}
