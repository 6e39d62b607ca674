//! Quorum report: every registered identity with its resolved weight.

use ballot_delegation::{Eligibility, WeightResolver};
use ballot_types::{Identity, Registration};
use serde::Serialize;

/// One line of the quorum report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeightRow {
    pub identity: Identity,
    /// Registered numeric proxies; for `DEVELOPER` the declared proxy count.
    pub numeric_proxies: u64,
    /// Identities folded into this one: owner delegates, or the developer pool.
    pub linked_delegates: u64,
    pub weight: u64,
    pub eligibility: Eligibility,
}

/// Resolved weights of all registered identities at one point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuorumReport {
    pub rows: Vec<WeightRow>,
    /// Grand total of voting weight; delegated identities contribute zero.
    pub total_weight: u64,
}

impl QuorumReport {
    /// Build from a resolver snapshot and the registrations read in the
    /// same transaction. `DEVELOPER` is listed last, and only while active.
    pub fn build(resolver: &WeightResolver, registrations: &[Registration]) -> Self {
        let mut rows: Vec<WeightRow> = registrations
            .iter()
            .filter(|r| !r.identity.is_developer())
            .map(|registration| {
                let eligibility = resolver.eligibility(&registration.identity, Some(registration));
                WeightRow {
                    identity: registration.identity.clone(),
                    numeric_proxies: registration.numeric_proxies,
                    linked_delegates: resolver.graph().delegate_count(&registration.identity),
                    weight: eligibility.weight(),
                    eligibility,
                }
            })
            .collect();

        let developer = resolver.developer_weight();
        if developer.active {
            let eligibility = resolver.eligibility(&Identity::Developer, None);
            rows.push(WeightRow {
                identity: Identity::Developer,
                numeric_proxies: developer.declared_proxy_count,
                linked_delegates: developer.linked_count,
                weight: eligibility.weight(),
                eligibility,
            });
        }

        let total_weight = rows
            .iter()
            .fold(0u64, |total, row| total.saturating_add(row.weight));
        Self { rows, total_weight }
    }
}
