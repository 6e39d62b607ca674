//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RwTxn};

use ballot_store::{ReadTxn, Store, StoreError, WriteTxn};
use ballot_types::BallotError;

use crate::integrity::{check_integrity, IntegrityReport};
use crate::roster::LmdbRoster;
use crate::txn::{LmdbReadTxn, LmdbWriteTxn};
use crate::LmdbError;

/// Map size used when the caller has no preference (256 MiB).
pub const DEFAULT_MAP_SIZE: usize = 256 * 1024 * 1024;

/// Schema version written into `meta` on first open.
pub const SCHEMA_VERSION: u32 = 1;

const MAX_DBS: u32 = 16;
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Handles to every named database in the environment.
#[derive(Clone, Copy)]
pub(crate) struct Databases {
    /// identity -> empty
    pub roster: Database<Bytes, Bytes>,
    /// identity -> Registration
    pub registrations: Database<Bytes, Bytes>,
    /// delegation id (BE) -> Delegation
    pub delegations: Database<Bytes, Bytes>,
    /// delegated identity -> delegation id (BE)
    pub delegation_index: Database<Bytes, Bytes>,
    /// "developer" -> DeveloperSettings
    pub settings: Database<Bytes, Bytes>,
    /// topic id (BE) -> Topic
    pub topics: Database<Bytes, Bytes>,
    /// option id (BE) -> BallotOption
    pub options: Database<Bytes, Bytes>,
    /// vote id (BE) -> VoteRecord
    pub votes: Database<Bytes, Bytes>,
    /// identity ++ 0x00 ++ topic id (BE) -> vote id (BE)
    pub vote_index: Database<Bytes, Bytes>,
    /// id counters and schema version
    pub meta: Database<Bytes, Bytes>,
}

impl Databases {
    fn create(env: &Env, wtxn: &mut RwTxn<'_>) -> Result<Self, LmdbError> {
        Ok(Self {
            roster: env.create_database(wtxn, Some("roster"))?,
            registrations: env.create_database(wtxn, Some("registrations"))?,
            delegations: env.create_database(wtxn, Some("delegations"))?,
            delegation_index: env.create_database(wtxn, Some("delegation_index"))?,
            settings: env.create_database(wtxn, Some("settings"))?,
            topics: env.create_database(wtxn, Some("topics"))?,
            options: env.create_database(wtxn, Some("options"))?,
            votes: env.create_database(wtxn, Some("votes"))?,
            vote_index: env.create_database(wtxn, Some("vote_index"))?,
            meta: env.create_database(wtxn, Some("meta"))?,
        })
    }
}

/// Durable ballot store backed by one LMDB environment.
pub struct LmdbStore {
    env: Arc<Env>,
    dbs: Databases,
    path: PathBuf,
}

impl LmdbStore {
    /// Open or create the environment at `path`.
    ///
    /// Refuses a database written with a newer schema version.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per store and never
        // concurrently with another `open` of the same path in this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let dbs = Databases::create(&env, &mut wtxn)?;
        let stored = dbs.meta.get(&wtxn, SCHEMA_VERSION_KEY)?.map(<[u8]>::to_vec);
        let version = match stored {
            Some(bytes) => {
                let raw = <[u8; 4]>::try_from(bytes.as_slice()).map_err(|_| {
                    LmdbError::Serialization("schema version is not 4 bytes".into())
                })?;
                u32::from_be_bytes(raw)
            }
            None => {
                dbs.meta
                    .put(&mut wtxn, SCHEMA_VERSION_KEY, &SCHEMA_VERSION.to_be_bytes())?;
                SCHEMA_VERSION
            }
        };
        if version > SCHEMA_VERSION {
            return Err(LmdbError::Schema {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, version, "opened ballot database");
        Ok(Self {
            env: Arc::new(env),
            dbs,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The roster table of this environment.
    pub fn roster(&self) -> LmdbRoster {
        LmdbRoster::new(Arc::clone(&self.env), self.dbs.roster)
    }

    /// Count entries in every table, collecting read failures.
    pub fn check_integrity(&self) -> Result<IntegrityReport, LmdbError> {
        check_integrity(&self.env)
    }
}

fn backend(e: heed::Error) -> StoreError {
    LmdbError::from(e).into()
}

impl Store for LmdbStore {
    fn read<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R, BallotError>,
    {
        let rtxn = self.env.read_txn().map_err(backend)?;
        f(&LmdbReadTxn::new(&self.dbs, &rtxn))
    }

    fn write<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R, BallotError>,
    {
        let wtxn = self.env.write_txn().map_err(backend)?;
        let mut txn = LmdbWriteTxn::new(&self.dbs, wtxn);
        // Dropping `txn` on error aborts the LMDB transaction.
        let result = f(&mut txn)?;
        txn.commit()?;
        Ok(result)
    }
}
