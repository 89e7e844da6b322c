use indexmap::IndexSet;
use std::cell::RefCell;
use std::hash::Hash;

/// Coalesces repeated notifications about the same key.
///
/// A key scheduled many times before a flush is delivered once, keys are delivered in
/// the order they were first scheduled.
#[derive(Debug)]
pub struct Debounce<K> {
    scheduled: RefCell<IndexSet<K>>,
}

impl<K> Default for Debounce<K> {
    fn default() -> Self {
        Self {
            scheduled: RefCell::new(IndexSet::new()),
        }
    }
}

impl<K: Hash + Eq + Clone> Debounce<K> {
    /// Schedule a key. Return false if it is already scheduled.
    pub fn schedule(&self, key: K) -> bool {
        self.scheduled.borrow_mut().insert(key)
    }

    pub fn is_scheduled(&self, key: &K) -> bool {
        self.scheduled.borrow().contains(key)
    }

    /// Drop a scheduled key without delivering it.
    pub fn cancel(&self, key: &K) -> bool {
        self.scheduled.borrow_mut().shift_remove(key)
    }

    /// Drop all scheduled keys.
    pub fn cancel_all(&self) {
        self.scheduled.borrow_mut().clear();
    }

    /// Deliver all scheduled keys. Keys scheduled by `deliver` itself wait for the next flush.
    pub fn flush(&self, mut deliver: impl FnMut(K)) {
        let keys = std::mem::take(&mut *self.scheduled.borrow_mut());
        keys.into_iter().for_each(&mut deliver);
    }
}
