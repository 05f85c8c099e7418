//! Scoped identifier allocation.
//!
//! Networks and neurons draw their ids from an [`IdRegistry`] that the caller
//! passes in explicitly. Ids are never reused within a scope, so a released id
//! cannot collide with a later allocation.

use crate::error::{EvoError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Scope for network identifiers
pub const NETWORK_SCOPE: &str = "network";
/// Scope for neuron identifiers
pub const NEURON_SCOPE: &str = "neuron";

/// Opaque identifier allocated from a registry scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
struct Scope {
    next: u64,
    live: BTreeSet<Id>,
}

/// Registry of live identifiers, grouped by scope label
#[derive(Clone, Debug, Default)]
pub struct IdRegistry {
    scopes: BTreeMap<String, Scope>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id in `scope`
    pub fn allocate(&mut self, scope: &str) -> Id {
        let entry = self.scopes.entry(scope.to_string()).or_default();
        let id = Id(entry.next);
        entry.next += 1;
        entry.live.insert(id);
        id
    }

    /// Whether `id` is currently allocated in `scope`
    pub fn contains(&self, scope: &str, id: Id) -> bool {
        self.scopes
            .get(scope)
            .map_or(false, |s| s.live.contains(&id))
    }

    /// Release a live id
    pub fn release(&mut self, scope: &str, id: Id) -> Result<()> {
        let released = self
            .scopes
            .get_mut(scope)
            .map_or(false, |s| s.live.remove(&id));
        if released {
            Ok(())
        } else {
            Err(EvoError::NotFound(format!("id {} in scope '{}'", id, scope)))
        }
    }

    /// Number of live ids in `scope`
    pub fn live(&self, scope: &str) -> usize {
        self.scopes.get(scope).map_or(0, |s| s.live.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_unique() {
        let mut ids = IdRegistry::new();
        let a = ids.allocate(NEURON_SCOPE);
        let b = ids.allocate(NEURON_SCOPE);
        assert_ne!(a, b);
        assert_eq!(ids.live(NEURON_SCOPE), 2);
    }

    #[test]
    fn test_scopes_are_independent() {
        let mut ids = IdRegistry::new();
        let n = ids.allocate(NETWORK_SCOPE);
        assert!(ids.contains(NETWORK_SCOPE, n));
        assert!(!ids.contains(NEURON_SCOPE, n));
    }

    #[test]
    fn test_release() {
        let mut ids = IdRegistry::new();
        let a = ids.allocate(NEURON_SCOPE);
        ids.release(NEURON_SCOPE, a).unwrap();
        assert!(!ids.contains(NEURON_SCOPE, a));
        assert!(matches!(
            ids.release(NEURON_SCOPE, a),
            Err(EvoError::NotFound(_))
        ));
    }

    #[test]
    fn test_released_ids_not_reused() {
        let mut ids = IdRegistry::new();
        let a = ids.allocate(NEURON_SCOPE);
        ids.release(NEURON_SCOPE, a).unwrap();
        let b = ids.allocate(NEURON_SCOPE);
        assert_ne!(a, b);
    }
}
