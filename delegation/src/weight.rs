//! Weight resolution.
//!
//! Rules, first match wins:
//! 1. `DEVELOPER`: 0 if inactive, else base weight + declared proxies + pool size.
//! 2. Absorbed into the developer pool: 0.
//! 3. Represented by another identity: 0.
//! 4. Otherwise: 1 + numeric proxies + number of identities it represents.

use ballot_store::{ReadTxn, StoreError};
use ballot_types::{DeveloperSettings, Identity, Registration};
use serde::Serialize;

use crate::DelegationGraph;

/// Both developer quantities, exposed separately for diagnostics.
///
/// `declared_proxy_count` is budgeted by an administrator while
/// `linked_count` counts identities actually in the pool; the total sums them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeveloperWeight {
    pub active: bool,
    pub base_weight: u64,
    pub declared_proxy_count: u64,
    pub linked_count: u64,
    /// Effective weight: zero while inactive.
    pub total: u64,
}

/// Why an identity may or may not vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Eligibility {
    Eligible { weight: u64 },
    DeveloperInactive,
    DeveloperWithoutWeight,
    AbsorbedByDeveloper,
    RepresentedBy { primary: Identity },
}

impl Eligibility {
    pub fn weight(&self) -> u64 {
        match self {
            Self::Eligible { weight } => *weight,
            _ => 0,
        }
    }
}

/// Point-in-time weight resolver over a delegation snapshot.
///
/// Results must not be cached past the transaction the snapshot came from.
#[derive(Clone, Debug, Default)]
pub struct WeightResolver {
    graph: DelegationGraph,
    settings: DeveloperSettings,
}

impl WeightResolver {
    pub fn new(graph: DelegationGraph, settings: DeveloperSettings) -> Self {
        Self { graph, settings }
    }

    /// Snapshot the delegation graph and developer settings.
    pub fn load(txn: &dyn ReadTxn) -> Result<Self, StoreError> {
        Ok(Self::new(
            DelegationGraph::load(txn)?,
            txn.developer_settings()?,
        ))
    }

    pub fn graph(&self) -> &DelegationGraph {
        &self.graph
    }

    pub fn developer_weight(&self) -> DeveloperWeight {
        let linked_count = self.graph.developer_pool_size();
        let total = if self.settings.active {
            self.settings
                .base_weight
                .saturating_add(self.settings.declared_proxy_count)
                .saturating_add(linked_count)
        } else {
            0
        };
        DeveloperWeight {
            active: self.settings.active,
            base_weight: self.settings.base_weight,
            declared_proxy_count: self.settings.declared_proxy_count,
            linked_count,
            total,
        }
    }

    /// Effective weight of `identity`. A missing registration counts as zero
    /// numeric proxies; rejecting unregistered voters is the ledger's job.
    pub fn resolve(&self, identity: &Identity, registration: Option<&Registration>) -> u64 {
        self.eligibility(identity, registration).weight()
    }

    pub fn eligibility(
        &self,
        identity: &Identity,
        registration: Option<&Registration>,
    ) -> Eligibility {
        if identity.is_developer() {
            if !self.settings.active {
                return Eligibility::DeveloperInactive;
            }
            return match self.developer_weight().total {
                0 => Eligibility::DeveloperWithoutWeight,
                weight => Eligibility::Eligible { weight },
            };
        }
        if self.graph.is_absorbed(identity) {
            return Eligibility::AbsorbedByDeveloper;
        }
        if let Some(primary) = self.graph.primary_of(identity) {
            return Eligibility::RepresentedBy {
                primary: primary.clone(),
            };
        }
        let numeric_proxies = registration.map_or(0, |r| r.numeric_proxies);
        Eligibility::Eligible {
            weight: 1u64
                .saturating_add(numeric_proxies)
                .saturating_add(self.graph.delegate_count(identity)),
        }
    }

    /// Resolve against the registration stored in `txn`.
    pub fn resolve_in(&self, txn: &dyn ReadTxn, identity: &Identity) -> Result<u64, StoreError> {
        Ok(self.resolve(identity, txn.registration(identity)?.as_ref()))
    }
}
