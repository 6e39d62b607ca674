//! Append-only vote ledger.
//!
//! Every vote record commits to its predecessor's hash, forming one chain
//! across all topics in ascending id order. The chain starts at
//! [`ChainHash::GENESIS`](ballot_types::ChainHash::GENESIS). Weights are
//! resolved once at append time and frozen into the record.

pub mod chain;
pub mod tally;
pub mod verify;

pub use chain::{cast_vote, link_record, CastRequest};
pub use tally::{tally, Tally};
pub use verify::{recompute_hash, verify_chain, verify_records, VerificationResult};
