use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::runtime::Runtime;
use crate::store::builder::StoreBuilder;
use crate::store::derived::Derived;
use crate::store::error::StoreError;
use crate::store::handle::ModuleHandle;
use crate::store::module::Module;

type Subscriber = Box<dyn Fn(&CommitEvent) + Send + Sync>;

/// Notification passed to store-wide subscribers after each commit.
#[derive(Clone, Debug)]
pub struct CommitEvent {
    /// Key of the module that committed.
    pub module: String,
    /// The committed mutation, rendered with its `Debug` impl.
    pub mutation: String,
}

/// A mounted module's state plus the runtime cell it is tracked under.
pub(crate) struct StateCell<S> {
    pub(crate) value: Arc<RwLock<S>>,
    pub(crate) id: usize,
}

/// A module together with its live state, as kept in the registry.
pub(crate) struct Mounted<M: Module> {
    pub(crate) module: M,
    pub(crate) cell: StateCell<M::State>,
}

/// Object-safe view of a mounted module for the string-keyed registry.
pub(crate) trait AnyMounted: Send + Sync {
    fn snapshot(&self) -> Result<Value, serde_json::Error>;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<M: Module> AnyMounted for Mounted<M> {
    fn snapshot(&self) -> Result<Value, serde_json::Error> {
        let state = self.cell.value.read().unwrap();
        serde_json::to_value(&*state)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub(crate) struct StoreInner {
    pub(crate) modules: BTreeMap<String, Arc<dyn AnyMounted>>,
    pub(crate) subscribers: RwLock<Vec<Subscriber>>,
    pub(crate) runtime: Arc<Runtime>,
}

impl StoreInner {
    pub(crate) fn has_subscribers(&self) -> bool {
        !self.subscribers.read().unwrap().is_empty()
    }

    pub(crate) fn emit(&self, event: &CommitEvent) {
        let subscribers = self.subscribers.read().unwrap();
        for subscriber in subscribers.iter() {
            subscriber(event);
        }
    }
}

/// The central state container.
///
/// A store is a fixed mapping from string keys to mounted [`Module`]s,
/// sealed when [`StoreBuilder::build`] runs. All interaction goes through
/// typed [`ModuleHandle`]s obtained with [`Store::module`]; the store
/// itself only offers the cross-module surface: subscriptions, snapshots
/// and derived values.
///
/// Stores are cheap to clone; clones share the same state. Independent
/// stores never share state, even within one process.
///
/// # Examples
///
/// ```
/// use number_place_store::number_place::{self, Cell, Mutation, NumberPlace};
/// use number_place_store::Store;
///
/// let store = Store::builder()
///     .module(number_place::KEY, NumberPlace::default())?
///     .build();
///
/// let game = store.module::<NumberPlace>(number_place::KEY)?;
/// game.commit(Mutation::Select(Cell::new(3, 4)));
/// assert_eq!(game.read(|s| s.selected), Some(Cell::new(3, 4)));
/// # Ok::<(), number_place_store::StoreError>(())
/// ```
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Start building a store. Modules mount on the runtime that is
    /// current when this is called.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    /// Typed access to the module mounted under `key`.
    ///
    /// Fails if the key is unknown, or if the module under it is not an
    /// `M`.
    pub fn module<M: Module>(&self, key: &str) -> Result<ModuleHandle<M>, StoreError> {
        let mounted = self
            .inner
            .modules
            .get(key)
            .ok_or_else(|| StoreError::UnknownModule(key.to_string()))?;

        let mounted = Arc::clone(mounted)
            .into_any()
            .downcast::<Mounted<M>>()
            .map_err(|_| StoreError::ModuleShape {
                key: key.to_string(),
                expected: std::any::type_name::<M>(),
            })?;

        Ok(ModuleHandle::new(
            key.to_string(),
            mounted,
            Arc::clone(&self.inner),
        ))
    }

    /// Whether a module is mounted under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.modules.contains_key(key)
    }

    /// Keys of every mounted module, sorted.
    pub fn module_keys(&self) -> Vec<String> {
        self.inner.modules.keys().cloned().collect()
    }

    /// Number of mounted modules.
    pub fn len(&self) -> usize {
        self.inner.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.modules.is_empty()
    }

    /// Subscribe to commits from every module in this store.
    ///
    /// Callbacks run on the committing thread, in registration order,
    /// after the state change has landed. Committing from inside a
    /// callback is not supported.
    pub fn subscribe<F>(&self, f: F)
    where
        F: Fn(&CommitEvent) + Send + Sync + 'static,
    {
        self.inner.subscribers.write().unwrap().push(Box::new(f));
    }

    /// Serialize the full state tree: one JSON object keyed by module.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        let mut tree = serde_json::Map::new();
        for (key, mounted) in &self.inner.modules {
            let state = mounted.snapshot().map_err(|source| StoreError::Snapshot {
                module: key.clone(),
                source,
            })?;
            tree.insert(key.clone(), state);
        }
        Ok(Value::Object(tree))
    }

    /// A cached value computed from any state in this store.
    ///
    /// `f` may read through any number of module handles; every read is
    /// tracked, and the value recomputes lazily once any of them changes.
    pub fn derived<T, F>(&self, f: F) -> Derived<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Derived::new(Arc::clone(&self.inner.runtime), f)
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
