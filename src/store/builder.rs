use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::runtime::Runtime;
use crate::store::error::StoreError;
use crate::store::module::Module;
use crate::store::plugin;
use crate::store::store::{AnyMounted, Mounted, StateCell, Store, StoreInner};

/// Configuration object for a [`Store`]: the named-module mapping.
///
/// The builder captures the runtime current at creation, so stores built
/// inside [`Runtime::scope`] stay on that scope's runtime even if they
/// outlive the scope.
pub struct StoreBuilder {
    runtime: Arc<Runtime>,
    modules: BTreeMap<String, Arc<dyn AnyMounted>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            runtime: Runtime::current(),
            modules: BTreeMap::new(),
        }
    }

    /// Mount `module` under `key`.
    ///
    /// The module's state factory runs here and the result becomes the
    /// live state once the store is built. Keys are unique; reusing one
    /// is an error rather than a silent replacement.
    pub fn module<M: Module>(
        mut self,
        key: impl Into<String>,
        module: M,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        if self.modules.contains_key(&key) {
            return Err(StoreError::DuplicateModule(key));
        }

        let cell = StateCell {
            value: Arc::new(RwLock::new(module.initial_state())),
            id: self.runtime.next_id(),
        };
        self.modules.insert(key, Arc::new(Mounted { module, cell }));
        Ok(self)
    }

    /// Seal the module mapping and construct the store.
    ///
    /// Installs the state plugin first, a no-op after the first time, so
    /// enablement always precedes construction.
    pub fn build(self) -> Store {
        plugin::install();
        tracing::debug!(modules = self.modules.len(), "store built");

        Store::from_inner(Arc::new(StoreInner {
            modules: self.modules,
            subscribers: RwLock::new(Vec::new()),
            runtime: self.runtime,
        }))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("modules", &self.modules.keys())
            .finish_non_exhaustive()
    }
}
