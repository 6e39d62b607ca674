//! Delegation records: owner delegation edges and developer pool membership.

use serde::{Deserialize, Serialize};

use crate::{DelegationId, Identity};

/// What kind of delegation a record represents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationKind {
    /// `delegate` is represented by `primary` and may not vote on its own behalf.
    Owner { primary: Identity, delegate: Identity },
    /// `identity` is absorbed into the `DEVELOPER` aggregate.
    Developer { identity: Identity, note: String },
}

/// A stored delegation with its store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub id: DelegationId,
    pub kind: DelegationKind,
}

impl Delegation {
    /// The identity that loses its individual vote through this delegation.
    pub fn delegated(&self) -> &Identity {
        self.kind.delegated()
    }
}

impl DelegationKind {
    pub fn delegated(&self) -> &Identity {
        match self {
            Self::Owner { delegate, .. } => delegate,
            Self::Developer { identity, .. } => identity,
        }
    }
}
