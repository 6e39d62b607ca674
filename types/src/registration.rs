//! Per-identity registration records.

use serde::{Deserialize, Serialize};

use crate::Identity;

/// Registration of an identity for the current meeting.
///
/// `numeric_proxies` is an administrator-entered multiplier that is not tied
/// to any other identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub identity: Identity,
    pub numeric_proxies: u64,
}

impl Registration {
    pub fn new(identity: Identity, numeric_proxies: u64) -> Self {
        Self {
            identity,
            numeric_proxies,
        }
    }
}
