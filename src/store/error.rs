use thiserror::Error;

/// Boxed error an action handler may return.
///
/// Handlers bubble up whatever went wrong (bad payloads, failed IO in the
/// caller's wiring); the store wraps it into [`StoreError::Action`] with
/// the module key attached.
pub type ModuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A builder was given the same module key twice.
    #[error("module key {0:?} is already registered")]
    DuplicateModule(String),

    /// A lookup used a key no module was mounted under.
    #[error("no module registered under key {0:?}")]
    UnknownModule(String),

    /// A lookup asked for a different module type than the one mounted.
    #[error("module {key:?} is not a {expected}")]
    ModuleShape {
        key: String,
        expected: &'static str,
    },

    /// An action handler failed.
    #[error("action failed in module {module:?}")]
    Action {
        module: String,
        #[source]
        source: ModuleError,
    },

    /// A module state could not be serialized for a snapshot.
    #[error("could not snapshot state of module {module:?}")]
    Snapshot {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}
