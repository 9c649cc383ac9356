// # In-Memory IP Registry
//
// The live identifier → IP directory.
//
// ## Lifetime
//
// - Entries live for the lifetime of the process; there is no expiry
// - Nothing is persisted; a restart starts from an empty directory
//
// ## Locking
//
// One reader-writer lock around one map. Readers share access, a writer
// excludes everyone. The lock is never held across an await point or while
// any other lock in the crate is held.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

/// Thread-safe identifier → IP directory with change detection
///
/// Addresses are stored in canonical form (IPv4-mapped IPv6 collapses to
/// IPv4), so two spellings of the same address never count as a change.
///
/// # Example
///
/// ```rust
/// use who_core::state::IpRegistry;
///
/// let registry = IpRegistry::new();
/// let ip = "10.0.0.1".parse().unwrap();
///
/// assert!(registry.set("alice", ip));
/// assert!(!registry.set("alice", ip));
/// assert_eq!(registry.get("alice"), Some(ip));
/// ```
#[derive(Debug, Default)]
pub struct IpRegistry {
    inner: RwLock<HashMap<String, IpAddr>>,
}

impl IpRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `ip` under `identifier`
    ///
    /// Returns `true` when no mapping existed or the stored address differed,
    /// `false` when the stored address already equals `ip`.
    pub fn set(&self, identifier: &str, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let previous = guard.insert(identifier.to_string(), ip);
        previous != Some(ip)
    }

    /// Look up the address currently mapped to `identifier`
    pub fn get(&self, identifier: &str) -> Option<IpAddr> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(identifier).copied()
    }

    /// Get the number of identifiers in the registry
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
