//! Delegation graph and vote weight resolution.
//!
//! Three mechanisms decide whether an identity may vote and with what weight:
//! - **Numeric proxies** from its registration
//! - **Owner delegation**: one identity represented by another (one hop)
//! - **Developer delegation**: identities absorbed into the `DEVELOPER` aggregate
//!
//! [`WeightResolver`] evaluates them in a fixed order; [`rules`] holds the
//! invariants every new delegation must satisfy.

pub mod graph;
pub mod rules;
pub mod weight;

pub use graph::DelegationGraph;
pub use rules::{
    check_developer_delegation, check_developer_endpoint, check_owner_delegation,
    check_owner_endpoints,
};
pub use weight::{DeveloperWeight, Eligibility, WeightResolver};
