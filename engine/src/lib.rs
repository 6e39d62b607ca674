//! The voting core as one operation surface.
//!
//! [`VotingEngine`] owns a transactional store, the external roster and a
//! clock. Every operation runs in exactly one store transaction; mutations
//! either fully apply or leave no trace, and transient commit conflicts are
//! retried a bounded number of times.

pub mod config;
pub mod engine;
pub mod report;

pub use config::EngineConfig;
pub use engine::VotingEngine;
pub use report::{QuorumReport, WeightRow};

pub use ballot_delegation::{DeveloperWeight, Eligibility};
pub use ballot_ledger::{Tally, VerificationResult};
