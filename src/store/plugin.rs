use std::sync::OnceLock;

use crate::runtime::Runtime;

static INSTALLED: OnceLock<()> = OnceLock::new();

/// Enable the state plugin for this process.
///
/// Primes the default [`Runtime`] and flips a process-wide flag. Safe to
/// call any number of times from any thread; only the first call does
/// anything. Returns whether this call performed the installation.
///
/// [`build`](crate::StoreBuilder::build) calls this itself, so enablement
/// always happens before a store exists; calling it earlier by hand, as
/// [`create_store`](crate::create_store) does, is harmless.
pub fn install() -> bool {
    let first = INSTALLED.set(()).is_ok();
    if first {
        Runtime::global();
        tracing::debug!("state plugin installed");
    } else {
        tracing::trace!("state plugin already installed");
    }
    first
}

/// Whether [`install`] has run in this process.
pub fn is_installed() -> bool {
    INSTALLED.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_installs_are_refused() {
        // Some other test may have installed already; only the repeat
        // behavior is deterministic here.
        install();
        assert!(is_installed());
        assert!(!install());
        assert!(!install());
    }
}
