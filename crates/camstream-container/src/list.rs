//! Generic mutex-protected ordered list.
//!
//! `OrderedList<T>` is the single container type every other camstream
//! crate builds on: the pipeline registry keys pipelines by device name,
//! and each pipeline keeps its listeners in one of these. The container
//! never reasons about what `T` is; callers supply comparison and
//! traversal behavior as closures rather than the original's
//! `void*`-based callback table.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

/// A mutex-protected, insertion-ordered list of `T`.
///
/// Elements are always iterated and removed in the order they were added.
/// All operations lock internally except [`OrderedList::lock`], which
/// hands back a guard for callers that need to perform several operations
/// atomically (e.g. "append only if no equivalent element exists").
#[derive(Debug)]
pub struct OrderedList<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> OrderedList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends `element` to the end of the list.
    pub fn add(&self, element: T) {
        self.inner.lock().push_back(element);
    }

    /// Removes the first element for which `predicate` returns `true`.
    ///
    /// Returns `true` if an element was removed, `false` if none matched.
    pub fn remove_where(&self, predicate: impl Fn(&T) -> bool) -> bool {
        let mut guard = self.inner.lock();
        if let Some(pos) = guard.iter().position(predicate) {
            guard.remove(pos);
            true
        } else {
            false
        }
    }

    /// Removes every element from the list.
    pub fn remove_all(&self) {
        self.inner.lock().clear();
    }

    /// Returns the number of elements currently in the list.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns a clone of the element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().get(index).cloned()
    }

    /// Calls `f` once for every element, in insertion order, while holding
    /// the lock for the whole traversal.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        let guard = self.inner.lock();
        for element in guard.iter() {
            f(element);
        }
    }

    /// Locks the list for a multi-step operation, returning a guard that
    /// derefs to `&VecDeque<T>`/`&mut VecDeque<T>`.
    pub fn lock(&self) -> OrderedListGuard<'_, T> {
        OrderedListGuard {
            guard: self.inner.lock(),
        }
    }
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`OrderedList::lock`].
///
/// Unlocks automatically when dropped; there is no separate `unlock` call
/// in safe Rust, unlike the original's explicit `lock`/`unlock` pair.
pub struct OrderedListGuard<'a, T> {
    guard: MutexGuard<'a, VecDeque<T>>,
}

impl<T> Deref for OrderedListGuard<'_, T> {
    type Target = VecDeque<T>;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl<T> DerefMut for OrderedListGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_len() {
        let list = OrderedList::new();
        list.add(1);
        list.add(2);
        list.add(3);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_empty_list() {
        let list: OrderedList<u32> = OrderedList::new();
        assert!(list.is_empty());
        assert_eq!(list.get(0), None);
    }

    #[test]
    fn test_remove_where() {
        let list = OrderedList::new();
        list.add("a".to_string());
        list.add("b".to_string());
        list.add("c".to_string());

        assert!(list.remove_where(|e| e == "b"));
        assert_eq!(list.len(), 2);
        assert!(!list.remove_where(|e| e == "b"));
    }

    #[test]
    fn test_remove_all() {
        let list = OrderedList::new();
        for i in 0..5 {
            list.add(i);
        }
        list.remove_all();
        assert!(list.is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let list = OrderedList::new();
        list.add(1);
        list.add(2);
        list.add(3);

        let mut seen = Vec::new();
        list.for_each(|e| seen.push(*e));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_get_by_index() {
        let list = OrderedList::new();
        list.add("first".to_string());
        list.add("second".to_string());

        assert_eq!(list.get(0), Some("first".to_string()));
        assert_eq!(list.get(1), Some("second".to_string()));
        assert_eq!(list.get(2), None);
    }

    #[test]
    fn test_explicit_lock_guard() {
        let list = OrderedList::new();
        {
            let mut guard = list.lock();
            guard.push_back(10);
            guard.push_back(20);
        }
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_single_element_boundary() {
        let list = OrderedList::new();
        list.add(42);
        assert_eq!(list.len(), 1);
        assert!(list.remove_where(|e| *e == 42));
        assert!(list.is_empty());
    }
}
