//! Cryptographic primitives for the ballot ledger.
//!
//! - **Blake2b-256** for the vote chain digests
//! - Canonical, length-prefixed encoding of the chained vote tuple

pub mod hash;

pub use hash::{blake2b_256_multi, vote_digest, VoteDigestInput};
