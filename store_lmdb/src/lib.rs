//! LMDB storage backend for the ballot ledger.
//!
//! Implements the `ballot-store` traits using the `heed` LMDB bindings.
//! Every logical table is one named database inside a single environment, so
//! a `Store::write` call maps onto exactly one LMDB write transaction.

pub mod environment;
pub mod error;
pub mod integrity;
pub mod roster;
pub mod txn;

pub use environment::{LmdbStore, DEFAULT_MAP_SIZE};
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use roster::LmdbRoster;
