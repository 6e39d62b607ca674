//! Abstract storage traits for the ballot ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod roster;
pub mod txn;

pub use error::StoreError;
pub use roster::Roster;
pub use txn::{ReadTxn, Store, WriteTxn};
