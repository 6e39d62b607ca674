//! Fundamental types for the ballot workspace.
//!
//! This crate defines the types shared across every other crate: identities,
//! ids, chain hashes, timestamps, the stored data model and the error taxonomy.

pub mod ballot;
pub mod delegation;
pub mod error;
pub mod hash;
pub mod identity;
pub mod ids;
pub mod registration;
pub mod settings;
pub mod time;
pub mod vote;

pub use ballot::{BallotOption, Topic};
pub use delegation::{Delegation, DelegationKind};
pub use error::BallotError;
pub use hash::ChainHash;
pub use identity::Identity;
pub use ids::{DelegationId, OptionId, TopicId, VoteId};
pub use registration::Registration;
pub use settings::DeveloperSettings;
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::VoteRecord;
