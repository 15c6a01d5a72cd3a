use std::fmt;

use serde::Serialize;

use crate::store::error::ModuleError;
use crate::store::handle::ModuleHandle;

/// Contract a named sub-store satisfies to be mounted into a
/// [`Store`](crate::Store).
///
/// A module bundles a slice of application state with the operations
/// allowed on it. The module value itself stays immutable after mounting;
/// everything that changes lives in its `State`.
///
/// - [`initial_state`](Module::initial_state) is the state factory, run
///   once when the module is mounted.
/// - [`mutate`](Module::mutate) applies a [`Mutation`](Module::Mutation)
///   synchronously. It is the only place state changes.
/// - [`handle`](Module::handle) runs an [`Action`](Module::Action):
///   arbitrary orchestration that commits zero or more mutations and may
///   fail. The default implementation ignores every action.
pub trait Module: Send + Sync + 'static {
    /// State owned by this module. Cloned out on reads and serialized
    /// into store snapshots.
    type State: Clone + Serialize + Send + Sync + 'static;

    /// Atomic state change. The `Debug` form is what subscribers and the
    /// logs see.
    type Mutation: fmt::Debug + Send + 'static;

    /// Higher-level operation, resolved into mutations by
    /// [`handle`](Module::handle).
    type Action: fmt::Debug + Send + 'static;

    /// Produce the state this module starts with.
    fn initial_state(&self) -> Self::State;

    /// Apply `mutation` to `state`.
    fn mutate(&self, state: &mut Self::State, mutation: Self::Mutation);

    /// Run `action`, committing mutations through `ctx`.
    fn handle(
        &self,
        ctx: &ActionContext<'_, Self>,
        action: Self::Action,
    ) -> Result<(), ModuleError>
    where
        Self: Sized,
    {
        let _ = (ctx, action);
        Ok(())
    }
}

/// What an action handler may do while it runs: read the module's current
/// state and commit mutations to it.
pub struct ActionContext<'a, M: Module> {
    handle: &'a ModuleHandle<M>,
}

impl<'a, M: Module> ActionContext<'a, M> {
    pub(crate) fn new(handle: &'a ModuleHandle<M>) -> Self {
        Self { handle }
    }

    /// Clone of the module state at this point in the action.
    pub fn state(&self) -> M::State {
        self.handle.get()
    }

    /// Read the state in place, without cloning.
    pub fn read<R>(&self, f: impl FnOnce(&M::State) -> R) -> R {
        self.handle.read(f)
    }

    /// Commit a mutation through the owning store. Watchers and
    /// subscribers fire before this returns.
    pub fn commit(&self, mutation: M::Mutation) {
        self.handle.commit(mutation);
    }
}
