//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the voting core (clock, roster, storage)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod roster;
pub mod store;

pub use clock::NullClock;
pub use roster::NullRoster;
pub use store::NullStore;
