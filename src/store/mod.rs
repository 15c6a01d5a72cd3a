//! The store layer: named modules, commits, actions and subscriptions.
//!
//! A [`Store`] is assembled once from a set of [`Module`]s via
//! [`StoreBuilder`], then shared. Each module owns a slice of state that
//! only its mutations may change; [`ModuleHandle`]s give typed access,
//! and [`Derived`] values plus watchers react to commits through the
//! runtime's dependency graph.

mod builder;
mod derived;
mod error;
mod handle;
mod module;
mod plugin;
mod store;
#[cfg(test)]
pub(crate) mod testutil;

pub use builder::StoreBuilder;
pub use derived::Derived;
pub use error::{ModuleError, StoreError};
pub use handle::{ModuleHandle, Subscription};
pub use module::{ActionContext, Module};
pub use plugin::{install, is_installed};
pub use store::{CommitEvent, Store};
