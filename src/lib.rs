//! # number-place-store
//!
//! The state layer of the Number Place application: a modular store in
//! the unidirectional-update style, with reactive reads on top.
//!
//! State lives in named [`Module`]s mounted into a [`Store`]. Mutations
//! are the only writes, actions orchestrate them, and watchers, derived
//! values and store-wide subscribers observe the results. UI, puzzle
//! rules and persistence all live outside this crate.
//!
//! ## Store layer (high-level)
//!
//! - [`Store`] / [`StoreBuilder`]: the sealed key-to-module mapping
//! - [`ModuleHandle`]: typed reads, commits and dispatches for one module
//! - [`Derived`]: cached values that recompute when their inputs change
//! - [`install`]: process-wide enablement, run once no matter how often
//!   it is called
//!
//! ## Runtime layer (low-level)
//!
//! - [`runtime::Runtime`]: the dependency graph that connects commits to
//!   the watchers and derived values that read the committed state
//!
//! ## Quick start
//!
//! ```
//! use number_place_store::create_store;
//! use number_place_store::number_place::{self, Action, Cell, NumberPlace};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = create_store()?;
//! let game = store.module::<NumberPlace>(number_place::KEY)?;
//!
//! let remaining = game.derived(|state| state.remaining());
//! assert_eq!(remaining.get(), 81);
//!
//! game.dispatch(Action::Place {
//!     cell: Cell::new(0, 0),
//!     digit: 5,
//! })?;
//! assert_eq!(remaining.get(), 80);
//!
//! let tree = store.snapshot()?;
//! assert_eq!(tree["numberPlace"]["problemIndex"], 0);
//! # Ok(())
//! # }
//! ```

pub mod number_place;
pub mod runtime;
pub mod store;

pub use store::{
    install, is_installed, ActionContext, CommitEvent, Derived, Module, ModuleError, ModuleHandle,
    Store, StoreBuilder, StoreError, Subscription,
};

use number_place::NumberPlace;

/// Build the application store.
///
/// Enables the state plugin, then constructs a store with the
/// [`number_place`] module mounted under [`number_place::KEY`]. Each call
/// returns an independent store; the caller owns it and decides how to
/// share it.
///
/// # Examples
///
/// ```
/// use number_place_store::{create_store, number_place};
///
/// let store = create_store().unwrap();
/// assert!(store.contains(number_place::KEY));
/// ```
pub fn create_store() -> Result<Store, StoreError> {
    store::install();

    let store = Store::builder()
        .module(number_place::KEY, NumberPlace::default())?
        .build();
    Ok(store)
}
