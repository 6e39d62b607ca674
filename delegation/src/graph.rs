//! In-memory view of both delegation relations.
//!
//! Owner delegation is a one-hop edge `delegate -> primary` (a delegate has
//! at most one primary, a primary any number of delegates). Developer
//! delegation is set membership in the `DEVELOPER` pool.

use ballot_store::{ReadTxn, StoreError};
use ballot_types::{Delegation, DelegationId, DelegationKind, Identity};
use std::collections::{HashMap, HashSet};

/// Snapshot of the delegation relations, indexed both ways.
#[derive(Clone, Debug, Default)]
pub struct DelegationGraph {
    /// Owner edges: delegate -> (edge id, primary).
    primaries: HashMap<Identity, (DelegationId, Identity)>,
    /// Reverse index: primary -> set of direct delegates.
    delegates: HashMap<Identity, HashSet<Identity>>,
    /// Developer pool: member -> edge id.
    developer_pool: HashMap<Identity, DelegationId>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from stored delegation records.
    pub fn from_delegations<'a>(records: impl IntoIterator<Item = &'a Delegation>) -> Self {
        let mut graph = Self::new();
        for record in records {
            graph.insert(record);
        }
        graph
    }

    /// Load the graph from a store snapshot.
    pub fn load(txn: &dyn ReadTxn) -> Result<Self, StoreError> {
        Ok(Self::from_delegations(&txn.delegations()?))
    }

    /// Add a record to the view. A later record for the same delegated
    /// identity replaces the earlier one.
    pub fn insert(&mut self, record: &Delegation) {
        self.remove_identity(record.delegated());
        match &record.kind {
            DelegationKind::Owner { primary, delegate } => {
                self.primaries
                    .insert(delegate.clone(), (record.id, primary.clone()));
                self.delegates
                    .entry(primary.clone())
                    .or_default()
                    .insert(delegate.clone());
            }
            DelegationKind::Developer { identity, .. } => {
                self.developer_pool.insert(identity.clone(), record.id);
            }
        }
    }

    fn remove_identity(&mut self, identity: &Identity) {
        if let Some((_, old_primary)) = self.primaries.remove(identity) {
            if let Some(set) = self.delegates.get_mut(&old_primary) {
                set.remove(identity);
                if set.is_empty() {
                    self.delegates.remove(&old_primary);
                }
            }
        }
        self.developer_pool.remove(identity);
    }

    /// The identity representing `delegate`, if it is owner-delegated.
    pub fn primary_of(&self, delegate: &Identity) -> Option<&Identity> {
        self.primaries.get(delegate).map(|(_, primary)| primary)
    }

    /// Number of owner edges whose primary is `primary`.
    pub fn delegate_count(&self, primary: &Identity) -> u64 {
        self.delegates.get(primary).map_or(0, |s| s.len() as u64)
    }

    /// Whether `identity` is absorbed into the developer aggregate.
    pub fn is_absorbed(&self, identity: &Identity) -> bool {
        self.developer_pool.contains_key(identity)
    }

    /// Whether `identity` is the delegated party of any edge.
    pub fn is_delegated(&self, identity: &Identity) -> bool {
        self.primaries.contains_key(identity) || self.is_absorbed(identity)
    }

    /// Number of identities linked into the developer pool.
    pub fn developer_pool_size(&self) -> u64 {
        self.developer_pool.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(token: &str) -> Identity {
        Identity::parse(token).unwrap()
    }

    fn owner(edge: u64, primary: &str, delegate: &str) -> Delegation {
        Delegation {
            id: DelegationId::new(edge),
            kind: DelegationKind::Owner {
                primary: id(primary),
                delegate: id(delegate),
            },
        }
    }

    fn developer(edge: u64, identity: &str) -> Delegation {
        Delegation {
            id: DelegationId::new(edge),
            kind: DelegationKind::Developer {
                identity: id(identity),
                note: String::new(),
            },
        }
    }

    #[test]
    fn test_simple_delegation() {
        let graph = DelegationGraph::from_delegations(&[owner(1, "a", "b")]);
        assert_eq!(graph.primary_of(&id("b")), Some(&id("a")));
        assert_eq!(graph.delegate_count(&id("a")), 1);
        assert!(graph.is_delegated(&id("b")));
        assert!(!graph.is_delegated(&id("a")));
    }

    #[test]
    fn test_fan_in() {
        let records: Vec<_> = (0..5)
            .map(|i| owner(i + 1, "primary", &format!("d{i}")))
            .collect();
        let graph = DelegationGraph::from_delegations(&records);
        assert_eq!(graph.delegate_count(&id("primary")), 5);
        assert_eq!(graph.primary_of(&id("d3")), Some(&id("primary")));
    }

    #[test]
    fn test_developer_pool() {
        let graph = DelegationGraph::from_delegations(&[developer(1, "x"), developer(2, "y")]);
        assert_eq!(graph.developer_pool_size(), 2);
        assert!(graph.is_absorbed(&id("x")));
        assert!(graph.is_delegated(&id("y")));
        assert_eq!(graph.primary_of(&id("x")), None);
    }

    #[test]
    fn test_reinsert_moves_edge() {
        let mut graph = DelegationGraph::from_delegations(&[owner(1, "a", "b")]);
        graph.insert(&owner(2, "c", "b"));
        assert_eq!(graph.primary_of(&id("b")), Some(&id("c")));
        assert_eq!(graph.delegate_count(&id("a")), 0);
        assert_eq!(graph.delegate_count(&id("c")), 1);
    }

    #[test]
    fn test_no_delegations() {
        let graph = DelegationGraph::new();
        assert_eq!(graph.delegate_count(&id("a")), 0);
        assert_eq!(graph.developer_pool_size(), 0);
        assert!(!graph.is_delegated(&id("a")));
    }
}
