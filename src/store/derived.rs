use std::sync::{Arc, RwLock};

use crate::runtime::Runtime;

/// A cached value derived from store state.
///
/// The computation runs on first read and is cached; commits to any state
/// it read mark it stale, and the next read recomputes. Reads of a
/// `Derived` are themselves tracked, so one derived value may feed
/// another.
///
/// Dropping a `Derived` removes it from the dependency graph.
pub struct Derived<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    cached: Arc<RwLock<Option<T>>>,
    id: usize,
    runtime: Arc<Runtime>,
}

impl<T: Clone + Send + Sync + 'static> Derived<T> {
    pub(crate) fn new<F>(runtime: Arc<Runtime>, compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let id = runtime.next_id();
        runtime.register_derived(id);
        Self {
            compute: Arc::new(compute),
            cached: Arc::new(RwLock::new(None)),
            id,
            runtime,
        }
    }

    /// Current value, recomputing first if a dependency changed.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);

        if self.runtime.is_dirty(self.id) {
            let value = self.runtime.with_observer(self.id, || (self.compute)());
            *self.cached.write().unwrap() = Some(value.clone());
            self.runtime.mark_clean(self.id);
            value
        } else {
            self.cached.read().unwrap().as_ref().unwrap().clone()
        }
    }

    /// Read the current value in place, without cloning it out.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);

        if self.runtime.is_dirty(self.id) {
            let value = self.runtime.with_observer(self.id, || (self.compute)());
            *self.cached.write().unwrap() = Some(value);
            self.runtime.mark_clean(self.id);
        }

        let cached = self.cached.read().unwrap();
        f(cached.as_ref().unwrap())
    }
}

impl<T> Drop for Derived<T> {
    fn drop(&mut self) {
        self.runtime.remove_derived(self.id);
    }
}
