//! Nullable roster: an in-memory membership set.

use ballot_store::{Roster, StoreError};
use ballot_types::Identity;
use std::collections::HashSet;
use std::sync::RwLock;

/// An in-memory roster for testing.
#[derive(Default)]
pub struct NullRoster {
    members: RwLock<HashSet<Identity>>,
}

impl NullRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from raw tokens. Tokens that do not parse are skipped.
    pub fn with_members<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let roster = Self::new();
        for token in tokens {
            if let Ok(identity) = Identity::parse(token) {
                roster.add(identity);
            }
        }
        roster
    }

    pub fn add(&self, identity: Identity) {
        if let Ok(mut members) = self.members.write() {
            members.insert(identity);
        }
    }

    pub fn remove(&self, identity: &Identity) {
        if let Ok(mut members) = self.members.write() {
            members.remove(identity);
        }
    }
}

impl Roster for NullRoster {
    fn exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        let members = self
            .members
            .read()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(!identity.is_developer() && members.contains(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let roster = NullRoster::with_members(["a", "b"]);
        assert!(roster.exists(&Identity::parse("A").unwrap()).unwrap());
        assert!(!roster.exists(&Identity::parse("C").unwrap()).unwrap());
    }

    #[test]
    fn developer_is_never_a_member() {
        let roster = NullRoster::with_members(["developer"]);
        assert!(!roster.exists(&Identity::Developer).unwrap());
    }
}
