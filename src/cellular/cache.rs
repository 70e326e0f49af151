//! Memo tables for derived cellular data.
//!
//! Every derived object of the engine (chain complexes, groups, homs, forms)
//! is computed at most once per locator. Failures are memoized too, so a
//! request that cannot be answered keeps returning the same error.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::homology_error::HomologyError;

/// Anything holding memoized derived data should implement this.
pub trait InvalidateCache {
    /// Drop *all* memoized entries so future queries recompute them.
    fn invalidate_cache(&mut self);
}

impl<T: InvalidateCache + ?Sized> InvalidateCache for Box<T> {
    #[inline]
    fn invalidate_cache(&mut self) {
        (**self).invalidate_cache();
    }
}

#[derive(Debug)]
enum Slot<V> {
    Building(ThreadId),
    Done(Arc<V>),
    Failed(HomologyError),
}

/// Keyed memo table with interior mutability.
#[derive(Debug)]
pub struct Memo<K, V> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Memo<K, V>
where
    K: Clone + Debug + Eq + Hash,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, building it with `build` on first request.
    ///
    /// The lock is released while `build` runs, so builders may request
    /// other keys. Requesting a key from inside its own builder yields
    /// [`HomologyError::ReentrantRequest`]. If another thread is already
    /// building the key, the value is computed locally and not stored.
    pub fn get_or_try_insert_with<F>(&self, key: &K, build: F) -> Result<Arc<V>, HomologyError>
    where
        F: FnOnce() -> Result<V, HomologyError>,
    {
        let me = thread::current().id();
        let owner = {
            let mut slots = self.slots.lock();
            match slots.get(key) {
                Some(Slot::Done(v)) => return Ok(Arc::clone(v)),
                Some(Slot::Failed(e)) => return Err(e.clone()),
                Some(Slot::Building(t)) if *t == me => {
                    return Err(HomologyError::ReentrantRequest(format!("{} {key:?}", self.name)));
                }
                Some(Slot::Building(_)) => false,
                None => {
                    slots.insert(key.clone(), Slot::Building(me));
                    true
                }
            }
        };

        let result = build().map(Arc::new);
        if !owner {
            return result;
        }
        let mut slots = self.slots.lock();
        match &result {
            Ok(v) => {
                slots.insert(key.clone(), Slot::Done(Arc::clone(v)));
            }
            Err(e) => {
                log::debug!("{} {key:?} failed: {e}", self.name);
                slots.insert(key.clone(), Slot::Failed(e.clone()));
            }
        }
        result
    }

    /// Completed value, if any.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        match self.slots.lock().get(key) {
            Some(Slot::Done(v)) => Some(Arc::clone(v)),
            _ => None,
        }
    }

    /// Number of settled entries (successes and failures).
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|s| !matches!(s, Slot::Building(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.get_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn values_and_failures_are_memoized() {
        let memo: Memo<u32, String> = Memo::new("test");
        let calls = Cell::new(0);
        for _ in 0..3 {
            let v = memo
                .get_or_try_insert_with(&1, || {
                    calls.set(calls.get() + 1);
                    Ok("one".to_string())
                })
                .unwrap();
            assert_eq!(*v, "one");
        }
        for _ in 0..2 {
            let e = memo.get_or_try_insert_with(&2, || {
                calls.set(calls.get() + 1);
                Err(HomologyError::NoSolution)
            });
            assert_eq!(e.unwrap_err(), HomologyError::NoSolution);
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(memo.len(), 2);
        assert!(memo.peek(&2).is_none());
    }

    #[test]
    fn reentrant_request_is_an_error() {
        let memo: Memo<u32, u32> = Memo::new("test");
        let inner = memo.get_or_try_insert_with(&7, || {
            let again = memo.get_or_try_insert_with(&7, || Ok(0));
            assert!(matches!(again, Err(HomologyError::ReentrantRequest(_))));
            Ok(1)
        });
        assert_eq!(*inner.unwrap(), 1);
    }

    #[test]
    fn clearing_forgets_entries() {
        let mut memo: Memo<u32, u32> = Memo::new("test");
        memo.get_or_try_insert_with(&1, || Ok(1)).unwrap();
        memo.clear();
        assert!(memo.is_empty());
    }
}
