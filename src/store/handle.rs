use std::fmt;
use std::sync::{Arc, Weak};

use crate::runtime::Runtime;
use crate::store::derived::Derived;
use crate::store::error::StoreError;
use crate::store::module::{ActionContext, Module};
use crate::store::store::{CommitEvent, Mounted, StoreInner};

/// Typed access to one mounted module.
///
/// Handles are cheap to clone and all refer to the same live state; they
/// are how mutations are committed, actions dispatched and state read.
/// Reads made inside a [`Derived`] computation or a watcher are tracked
/// against this module, so commits to it invalidate exactly the values
/// that depend on it.
pub struct ModuleHandle<M: Module> {
    key: String,
    mounted: Arc<Mounted<M>>,
    store: Arc<StoreInner>,
}

impl<M: Module> ModuleHandle<M> {
    pub(crate) fn new(key: String, mounted: Arc<Mounted<M>>, store: Arc<StoreInner>) -> Self {
        Self {
            key,
            mounted,
            store,
        }
    }

    /// Key this module is mounted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Clone of the current module state.
    pub fn get(&self) -> M::State {
        self.store.runtime.track_read(self.mounted.cell.id);
        self.mounted.cell.value.read().unwrap().clone()
    }

    /// Read the state in place, without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&M::State) -> R) -> R {
        self.store.runtime.track_read(self.mounted.cell.id);
        let state = self.mounted.cell.value.read().unwrap();
        f(&state)
    }

    /// Commit a mutation.
    ///
    /// The mutation is applied synchronously under the state lock. Once
    /// the lock is released, watchers and derived values that read this
    /// module are invalidated, then store-wide subscribers see the
    /// [`CommitEvent`].
    pub fn commit(&self, mutation: M::Mutation) {
        tracing::debug!(module = %self.key, mutation = ?mutation, "commit");

        // Render the event up front: the mutation is consumed by `mutate`.
        let event = self.store.has_subscribers().then(|| CommitEvent {
            module: self.key.clone(),
            mutation: format!("{mutation:?}"),
        });

        {
            let mut state = self.mounted.cell.value.write().unwrap();
            self.mounted.module.mutate(&mut state, mutation);
        }

        self.store.runtime.invalidate(self.mounted.cell.id);
        if let Some(event) = event {
            self.store.emit(&event);
        }
    }

    /// Run an action through the module's handler.
    ///
    /// The handler commits mutations as it goes; there is no rollback on
    /// failure, the error just reports where the action stopped.
    pub fn dispatch(&self, action: M::Action) -> Result<(), StoreError> {
        tracing::debug!(module = %self.key, action = ?action, "dispatch");

        let ctx = ActionContext::new(self);
        self.mounted
            .module
            .handle(&ctx, action)
            .map_err(|source| StoreError::Action {
                module: self.key.clone(),
                source,
            })
    }

    /// Watch this module's state.
    ///
    /// `f` runs once immediately with the current state, then again after
    /// every commit to this module, on the committing thread. Dropping
    /// the returned [`Subscription`] detaches the watcher.
    pub fn watch<F>(&self, f: F) -> Subscription
    where
        F: Fn(&M::State) + Send + Sync + 'static,
    {
        let runtime = Arc::clone(&self.store.runtime);
        let id = runtime.next_id();
        let value = Arc::clone(&self.mounted.cell.value);

        let callback = Arc::new(f);
        let rerun = Arc::clone(&callback);
        runtime.register_watcher(id, move || {
            let state = value.read().unwrap();
            rerun(&state);
        });
        runtime.with_observer(id, || runtime.track_read(self.mounted.cell.id));

        {
            let state = self.mounted.cell.value.read().unwrap();
            callback(&state);
        }

        Subscription {
            id,
            runtime: Arc::downgrade(&runtime),
        }
    }

    /// A cached value computed from this module's state.
    ///
    /// Sugar over [`Store::derived`](crate::Store::derived) for the
    /// single-module case.
    pub fn derived<T, F>(&self, f: F) -> Derived<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&M::State) -> T + Send + Sync + 'static,
    {
        let handle = self.clone();
        Derived::new(Arc::clone(&self.store.runtime), move || handle.read(&f))
    }
}

impl<M: Module> fmt::Debug for ModuleHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<M: Module> Clone for ModuleHandle<M> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            mounted: Arc::clone(&self.mounted),
            store: Arc::clone(&self.store),
        }
    }
}

/// Keeps a watcher alive. Dropping it detaches the watcher from the
/// runtime; the watcher never fires again.
pub struct Subscription {
    id: usize,
    runtime: Weak<Runtime>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_watcher(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::store::Store;
    use crate::store::testutil::{Counter, CounterAction, CounterMutation};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counter_store() -> (Store, ModuleHandle<Counter>) {
        let store = Store::builder()
            .module("counter", Counter)
            .unwrap()
            .build();
        let handle = store.module::<Counter>("counter").unwrap();
        (store, handle)
    }

    #[test]
    fn commits_apply_in_order() {
        let (_store, counter) = counter_store();

        counter.commit(CounterMutation::Add(5));
        counter.commit(CounterMutation::Add(2));
        assert_eq!(counter.get().value, 7);

        counter.commit(CounterMutation::Reset);
        assert_eq!(counter.read(|s| s.value), 0);
    }

    #[test]
    fn actions_commit_through_their_context() {
        let (_store, counter) = counter_store();

        counter.dispatch(CounterAction::AddTwice(4)).unwrap();
        assert_eq!(counter.get().value, 8);
    }

    #[test]
    fn failed_actions_name_the_module() {
        let (_store, counter) = counter_store();

        let err = counter.dispatch(CounterAction::Fail).unwrap_err();
        match err {
            StoreError::Action { module, source } => {
                assert_eq!(module, "counter");
                assert_eq!(source.to_string(), "counter cannot do that");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn watchers_fire_immediately_and_per_commit() {
        Runtime::scope(|| {
            let (_store, counter) = counter_store();

            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            let sub = counter.watch(move |state| sink.lock().unwrap().push(state.value));

            counter.commit(CounterMutation::Add(1));
            counter.commit(CounterMutation::Add(1));
            assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);

            drop(sub);
            counter.commit(CounterMutation::Add(1));
            assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
        });
    }

    #[test]
    fn watchers_on_one_handle_see_commits_from_another() {
        Runtime::scope(|| {
            let (store, counter) = counter_store();
            let other = store.module::<Counter>("counter").unwrap();

            let calls = Arc::new(AtomicUsize::new(0));
            let bump = Arc::clone(&calls);
            let _sub = counter.watch(move |_| {
                bump.fetch_add(1, Ordering::SeqCst);
            });

            other.commit(CounterMutation::Add(1));
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        });
    }
}
