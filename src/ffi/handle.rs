//! Opaque `u64`-handle lookup table, the idiom the foreign-call surface
//! exposes its Rust objects through.
//!
//! Grounded on the `HandleStore`/`extern "C"` pattern used for tile-render
//! handles in the corpus's FFI examples. That idiom backs its table with a
//! `Mutex`-guarded `static` because its codebase is multi-threaded; this
//! crate's core is single-threaded and already built on `Rc<RefCell<_>>`
//! (non-`Send`), so [`HandleStore`] lives behind a `thread_local!` instead —
//! same opaque-handle lookup, no synchronization primitive the rest of the
//! crate doesn't already use.

use std::cell::RefCell;
use std::collections::HashMap;

/// An opaque handle. `0` is reserved to mean "no object" / "error".
pub type Handle = u64;

pub struct HandleStore<T> {
    next_id: RefCell<Handle>,
    items: RefCell<HashMap<Handle, T>>,
}

impl<T> HandleStore<T> {
    pub const fn new() -> Self {
        Self {
            next_id: RefCell::new(1),
            items: RefCell::new(HashMap::new()),
        }
    }

    /// Register `value`, returning a fresh non-zero handle.
    pub fn insert(&self, value: T) -> Handle {
        let mut next_id = self.next_id.borrow_mut();
        let handle = *next_id;
        *next_id += 1;
        self.items.borrow_mut().insert(handle, value);
        handle
    }

    /// Remove and return the object behind `handle`, if any.
    pub fn remove(&self, handle: Handle) -> Option<T> {
        self.items.borrow_mut().remove(&handle)
    }

    /// Run `f` against the object behind `handle`, if resident.
    pub fn with<R>(&self, handle: Handle, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.items.borrow_mut().get_mut(&handle).map(f)
    }
}

impl<T: Clone> HandleStore<T> {
    /// Clone the object behind `handle` out of the table, if resident.
    pub fn get_clone(&self, handle: Handle) -> Option<T> {
        self.items.borrow().get(&handle).cloned()
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_start_at_one_and_increment() {
        let store: HandleStore<&'static str> = HandleStore::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
    }

    #[test]
    fn remove_drops_the_entry() {
        let store = HandleStore::new();
        let h = store.insert(String::from("x"));
        assert!(store.remove(h).is_some());
        assert!(store.with(h, |_| ()).is_none());
    }

    #[test]
    fn with_mutates_in_place() {
        let store = HandleStore::new();
        let h = store.insert(0i32);
        store.with(h, |v| *v += 41);
        assert_eq!(store.with(h, |v| *v), Some(41));
    }
}
