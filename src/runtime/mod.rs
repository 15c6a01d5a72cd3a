//! Runtime support for the store layer.
//!
//! This module provides the infrastructure the store builds on: ID
//! allocation, read tracking, stale marking for derived values, and
//! watcher execution. Most code never touches it directly; tests use
//! [`Runtime::scope`] for isolation.

mod context;

pub use context::Runtime;
