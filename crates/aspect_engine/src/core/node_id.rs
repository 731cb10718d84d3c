//! Node identity shared by the frontend scene and every backend aspect
//!
//! A `NodeId` is the only handle backend code is allowed to keep for a
//! frontend node. It is minted once per node and never reused, so it stays
//! meaningful after the node itself has been destroyed; looking it up in the
//! frontend scene then simply misses.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next identifier to hand out. Zero is reserved for the null id.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique identifier of a frontend node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// The null identifier, never returned by [`NodeId::mint`]
    pub const NULL: Self = Self(0);

    /// Mint a fresh identifier
    pub fn mint() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Whether this is the null identifier
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Raw numeric value, mostly useful for logging
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "#null")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_minted_ids_are_distinct() {
        let ids: HashSet<NodeId> = (0..1000).map(|_| NodeId::mint()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_minted_ids_are_never_null() {
        for _ in 0..100 {
            assert!(!NodeId::mint().is_null());
        }
        assert!(NodeId::default().is_null());
        assert_eq!(NodeId::default(), NodeId::NULL);
    }

    #[test]
    fn test_minting_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..250).map(|_| NodeId::mint()).collect::<Vec<_>>()))
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(all.insert(id), "id {id} minted twice");
            }
        }
        assert_eq!(all.len(), 1000);
    }
}
