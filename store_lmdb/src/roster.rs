//! LMDB implementation of `Roster`.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use ballot_store::{Roster, StoreError};
use ballot_types::Identity;

use crate::LmdbError;

/// Roster kept in the `roster` table: identity -> empty value.
///
/// The ballot core never writes here; membership is maintained by an
/// administrator through [`LmdbRoster::add`] / [`LmdbRoster::remove`].
pub struct LmdbRoster {
    pub(crate) env: Arc<Env>,
    pub(crate) roster_db: Database<Bytes, Bytes>,
}

impl LmdbRoster {
    pub(crate) fn new(env: Arc<Env>, roster_db: Database<Bytes, Bytes>) -> Self {
        Self { env, roster_db }
    }

    /// Add members, returning how many were new. `DEVELOPER` is skipped.
    pub fn add<'a>(
        &self,
        identities: impl IntoIterator<Item = &'a Identity>,
    ) -> Result<u64, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut added = 0;
        for identity in identities.into_iter().filter(|i| !i.is_developer()) {
            let key = identity.as_str().as_bytes();
            if self
                .roster_db
                .get(&wtxn, key)
                .map_err(LmdbError::from)?
                .is_none()
            {
                self.roster_db
                    .put(&mut wtxn, key, &[])
                    .map_err(LmdbError::from)?;
                added += 1;
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::debug!(added, "roster updated");
        Ok(added)
    }

    /// Remove a member. Returns whether it was present.
    pub fn remove(&self, identity: &Identity) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let removed = self
            .roster_db
            .delete(&mut wtxn, identity.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(removed)
    }

    /// All members in token order.
    pub fn members(&self) -> Result<Vec<Identity>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut members = Vec::new();
        for entry in self.roster_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let token = std::str::from_utf8(key)
                .map_err(|e| StoreError::Corruption(format!("roster key: {e}")))?;
            let identity = Identity::parse(token)
                .map_err(|e| StoreError::Corruption(format!("roster key: {e}")))?;
            members.push(identity);
        }
        Ok(members)
    }
}

impl Roster for LmdbRoster {
    fn exists(&self, identity: &Identity) -> Result<bool, StoreError> {
        if identity.is_developer() {
            return Ok(false);
        }
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .roster_db
            .get(&rtxn, identity.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .is_some())
    }
}
