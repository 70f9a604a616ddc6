//! Holders for releasable scoped instances.
//!
//! A releasable binding keeps its instance in a holder that can be cleared on demand. The next access after a
//! release recomputes the instance and stores it again. Generated containers register every holder in an explicit
//! release dispatch method, so releasing is an enumerable operation over known fields rather than something left to
//! drop order.
//!
//! Two flavours exist, matching the emitter's thread-safety policy:
//! - [`ReleasableCell`] for single-threaded containers (`!Sync`, no locking),
//! - [`SyncReleasableCell`] for synchronized containers (a `Mutex` around the slot).
//!
//! Values are handed out by clone, so bindings meant to be shared usually use `Rc`/`Arc` key types.

use std::cell::RefCell;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A holder whose stored instance can be cleared.
pub trait Releasable {
    /// Drop the stored instance, if any. The next access recomputes it.
    fn release(&self);

    /// Whether an instance is currently stored.
    fn is_held(&self) -> bool;
}

/// Single-threaded releasable holder.
#[derive(Debug)]
pub struct ReleasableCell<T> {
    slot: RefCell<Option<T>>,
}

impl<T> ReleasableCell<T> {
    pub const fn new() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }
}

impl<T: Clone> ReleasableCell<T> {
    /// Return the stored instance, computing and storing it first if the holder is empty.
    ///
    /// The slot is not borrowed while `init` runs, so `init` may freely access other holders.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        let cached = self.slot.borrow().clone();
        if let Some(value) = cached {
            return value;
        }
        let value = init();
        *self.slot.borrow_mut() = Some(value.clone());
        value
    }
}

impl<T> Default for ReleasableCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Releasable for ReleasableCell<T> {
    fn release(&self) {
        self.slot.borrow_mut().take();
    }

    fn is_held(&self) -> bool {
        self.slot.borrow().is_some()
    }
}

/// Thread-safe releasable holder.
///
/// Two threads racing on an empty holder may both run their initializer; the first stored value wins and both
/// callers receive it.
#[derive(Debug)]
pub struct SyncReleasableCell<T> {
    slot: Mutex<Option<T>>,
}

impl<T> SyncReleasableCell<T> {
    pub const fn new() -> Self {
        Self { slot: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A panicking initializer never leaves the slot half-written, so a poisoned lock is still consistent.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> SyncReleasableCell<T> {
    /// Return the stored instance, computing and storing it first if the holder is empty.
    ///
    /// The lock is not held while `init` runs.
    pub fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        if let Some(value) = self.lock().clone() {
            return value;
        }
        let value = init();
        let mut slot = self.lock();
        match slot.as_ref() {
            Some(existing) => existing.clone(),
            None => {
                *slot = Some(value.clone());
                value
            }
        }
    }
}

impl<T> Default for SyncReleasableCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Releasable for SyncReleasableCell<T> {
    fn release(&self) {
        self.lock().take();
    }

    fn is_held(&self) -> bool {
        self.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_get_or_init_memoizes_until_released() {
        let cell = ReleasableCell::new();
        let calls = Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            Rc::new(calls.get())
        };

        let first = cell.get_or_init(make);
        let second = cell.get_or_init(make);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);

        cell.release();
        assert!(!cell.is_held());
        let third = cell.get_or_init(make);
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(*third, 2);
    }

    #[test]
    fn test_initializer_may_touch_other_cells() {
        let outer: ReleasableCell<u32> = ReleasableCell::new();
        let inner: ReleasableCell<u32> = ReleasableCell::new();
        let value = outer.get_or_init(|| inner.get_or_init(|| 20) + 1);
        assert_eq!(value, 21);
        assert!(outer.is_held());
        assert!(inner.is_held());
    }

    #[test]
    fn test_release_on_empty_cell_is_noop() {
        let cell: SyncReleasableCell<String> = SyncReleasableCell::default();
        cell.release();
        assert!(!cell.is_held());
    }
}
