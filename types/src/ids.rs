//! Numeric identifiers for stored entities.
//!
//! All ids are assigned by the store, start at 1 and are strictly increasing.
//! Their big-endian byte form sorts in id order, which the LMDB backend relies on.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// The id following this one.
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }

            pub fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }

            pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
                Self(u64::from_be_bytes(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

numeric_id!(
    /// Identifies a ballot topic.
    TopicId
);
numeric_id!(
    /// Identifies an option within a topic.
    OptionId
);
numeric_id!(
    /// Position of a vote record in the ledger; defines chain order.
    VoteId
);
numeric_id!(
    /// Identifies a delegation edge (owner or developer).
    DelegationId
);
