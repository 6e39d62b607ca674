//! `ReadTxn` / `WriteTxn` over heed transactions.
//!
//! Values are bincode-encoded. Numeric ids are stored as big-endian keys so
//! LMDB's lexicographic order is id order, which makes `last()` the chain
//! head and a full scan of `votes` the chain in append order.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use ballot_store::{ReadTxn, StoreError, WriteTxn};
use ballot_types::{
    BallotOption, Delegation, DelegationId, DelegationKind, DeveloperSettings, Identity,
    OptionId, Registration, Topic, TopicId, VoteId, VoteRecord,
};

use crate::environment::Databases;
use crate::LmdbError;

const DEVELOPER_SETTINGS_KEY: &[u8] = b"developer";
const LAST_DELEGATION_KEY: &[u8] = b"last_delegation_id";
const LAST_TOPIC_KEY: &[u8] = b"last_topic_id";
const LAST_OPTION_KEY: &[u8] = b"last_option_id";

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value).map_err(LmdbError::from)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes).map_err(LmdbError::from)?)
}

fn decode_id(bytes: &[u8]) -> Result<u64, StoreError> {
    let raw = <[u8; 8]>::try_from(bytes)
        .map_err(|_| StoreError::Corruption(format!("id of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

/// Prefix shared by every vote of `identity`. Identities never contain
/// control characters, so the NUL separator is unambiguous.
fn voter_prefix(identity: &Identity) -> Vec<u8> {
    let mut key = identity.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

/// `identity ++ 0x00 ++ topic_be_u64`
fn vote_index_key(identity: &Identity, topic: TopicId) -> Vec<u8> {
    let mut key = voter_prefix(identity);
    key.extend_from_slice(&topic.to_be_bytes());
    key
}

fn get<T: DeserializeOwned>(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match db.get(txn, key).map_err(LmdbError::from)? {
        Some(bytes) => decode(bytes).map(Some),
        None => Ok(None),
    }
}

fn scan<T: DeserializeOwned>(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for entry in db.iter(txn).map_err(LmdbError::from)? {
        let (_, bytes) = entry.map_err(LmdbError::from)?;
        out.push(decode(bytes)?);
    }
    Ok(out)
}

impl Databases {
    fn registration(
        &self,
        txn: &RoTxn<'_>,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        get(self.registrations, txn, identity.as_str().as_bytes())
    }

    fn delegation_of(
        &self,
        txn: &RoTxn<'_>,
        identity: &Identity,
    ) -> Result<Option<Delegation>, StoreError> {
        let id = self
            .delegation_index
            .get(txn, identity.as_str().as_bytes())
            .map_err(LmdbError::from)?;
        match id {
            Some(id) => get(self.delegations, txn, id),
            None => Ok(None),
        }
    }

    fn developer_settings(&self, txn: &RoTxn<'_>) -> Result<DeveloperSettings, StoreError> {
        Ok(get(self.settings, txn, DEVELOPER_SETTINGS_KEY)?.unwrap_or_default())
    }

    fn options_for(
        &self,
        txn: &RoTxn<'_>,
        topic: TopicId,
    ) -> Result<Vec<BallotOption>, StoreError> {
        let mut options: Vec<BallotOption> = scan(self.options, txn)?;
        options.retain(|o| o.topic_id == topic);
        Ok(options)
    }

    fn vote(
        &self,
        txn: &RoTxn<'_>,
        topic: TopicId,
        identity: &Identity,
    ) -> Result<Option<VoteRecord>, StoreError> {
        let id = self
            .vote_index
            .get(txn, &vote_index_key(identity, topic))
            .map_err(LmdbError::from)?;
        match id {
            Some(id) => get(self.votes, txn, id),
            None => Ok(None),
        }
    }

    fn has_voted(&self, txn: &RoTxn<'_>, identity: &Identity) -> Result<bool, StoreError> {
        let mut iter = self
            .vote_index
            .prefix_iter(txn, &voter_prefix(identity))
            .map_err(LmdbError::from)?;
        Ok(iter.next().transpose().map_err(LmdbError::from)?.is_some())
    }

    fn last_vote(&self, txn: &RoTxn<'_>) -> Result<Option<VoteRecord>, StoreError> {
        match self.votes.last(txn).map_err(LmdbError::from)? {
            Some((_, bytes)) => decode(bytes).map(Some),
            None => Ok(None),
        }
    }
}

/// Read-only view over an LMDB read transaction.
pub struct LmdbReadTxn<'t, 'e> {
    dbs: &'t Databases,
    txn: &'t RoTxn<'e>,
}

impl<'t, 'e> LmdbReadTxn<'t, 'e> {
    pub(crate) fn new(dbs: &'t Databases, txn: &'t RoTxn<'e>) -> Self {
        Self { dbs, txn }
    }

    fn ro(&self) -> &RoTxn<'e> {
        self.txn
    }
}

/// Read-write view over an LMDB write transaction.
///
/// Reads see this transaction's own uncommitted writes.
pub struct LmdbWriteTxn<'t> {
    dbs: &'t Databases,
    txn: RwTxn<'t>,
}

impl<'t> LmdbWriteTxn<'t> {
    pub(crate) fn new(dbs: &'t Databases, txn: RwTxn<'t>) -> Self {
        Self { dbs, txn }
    }

    fn ro(&self) -> &RoTxn<'t> {
        &self.txn
    }

    pub(crate) fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    /// Bump and persist the counter stored under `key`.
    fn next_id(&mut self, key: &[u8]) -> Result<u64, StoreError> {
        let last = match self.dbs.meta.get(&self.txn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode_id(bytes)?,
            None => 0,
        };
        let next = last + 1;
        self.dbs
            .meta
            .put(&mut self.txn, key, &next.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(next)
    }

    fn put<T: Serialize>(
        &mut self,
        db: Database<Bytes, Bytes>,
        key: &[u8],
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = encode(value)?;
        db.put(&mut self.txn, key, &bytes).map_err(LmdbError::from)?;
        Ok(())
    }
}

// Both views answer reads the same way; only the transaction differs.
macro_rules! impl_read_txn {
    ($view:ty) => {
        impl ReadTxn for $view {
            fn registration(
                &self,
                identity: &Identity,
            ) -> Result<Option<Registration>, StoreError> {
                self.dbs.registration(self.ro(), identity)
            }

            fn registrations(&self) -> Result<Vec<Registration>, StoreError> {
                scan(self.dbs.registrations, self.ro())
            }

            fn delegations(&self) -> Result<Vec<Delegation>, StoreError> {
                scan(self.dbs.delegations, self.ro())
            }

            fn delegation_of(&self, identity: &Identity) -> Result<Option<Delegation>, StoreError> {
                self.dbs.delegation_of(self.ro(), identity)
            }

            fn developer_settings(&self) -> Result<DeveloperSettings, StoreError> {
                self.dbs.developer_settings(self.ro())
            }

            fn topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError> {
                get(self.dbs.topics, self.ro(), &id.to_be_bytes())
            }

            fn topics(&self) -> Result<Vec<Topic>, StoreError> {
                scan(self.dbs.topics, self.ro())
            }

            fn option(&self, id: OptionId) -> Result<Option<BallotOption>, StoreError> {
                get(self.dbs.options, self.ro(), &id.to_be_bytes())
            }

            fn options_for(&self, topic: TopicId) -> Result<Vec<BallotOption>, StoreError> {
                self.dbs.options_for(self.ro(), topic)
            }

            fn vote(
                &self,
                topic: TopicId,
                identity: &Identity,
            ) -> Result<Option<VoteRecord>, StoreError> {
                self.dbs.vote(self.ro(), topic, identity)
            }

            fn has_voted(&self, identity: &Identity) -> Result<bool, StoreError> {
                self.dbs.has_voted(self.ro(), identity)
            }

            fn last_vote(&self) -> Result<Option<VoteRecord>, StoreError> {
                self.dbs.last_vote(self.ro())
            }

            fn votes(&self) -> Result<Vec<VoteRecord>, StoreError> {
                scan(self.dbs.votes, self.ro())
            }
        }
    };
}

impl_read_txn!(LmdbReadTxn<'_, '_>);
impl_read_txn!(LmdbWriteTxn<'_>);

impl WriteTxn for LmdbWriteTxn<'_> {
    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn put_registration(&mut self, registration: &Registration) -> Result<(), StoreError> {
        let dbs = self.dbs;
        self.put(
            dbs.registrations,
            registration.identity.as_str().as_bytes(),
            registration,
        )
    }

    fn insert_delegation(&mut self, kind: DelegationKind) -> Result<DelegationId, StoreError> {
        let dbs = self.dbs;
        let delegated = kind.delegated().as_str().as_bytes().to_vec();
        if dbs
            .delegation_index
            .get(&self.txn, &delegated)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "delegation of {}",
                kind.delegated()
            )));
        }
        let id = DelegationId::new(self.next_id(LAST_DELEGATION_KEY)?);
        self.put(dbs.delegations, &id.to_be_bytes(), &Delegation { id, kind })?;
        dbs.delegation_index
            .put(&mut self.txn, &delegated, &id.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(id)
    }

    fn remove_delegation(&mut self, id: DelegationId) -> Result<Option<Delegation>, StoreError> {
        let dbs = self.dbs;
        let Some(delegation) = get::<Delegation>(dbs.delegations, self.ro(), &id.to_be_bytes())?
        else {
            return Ok(None);
        };
        dbs.delegations
            .delete(&mut self.txn, &id.to_be_bytes())
            .map_err(LmdbError::from)?;
        dbs.delegation_index
            .delete(&mut self.txn, delegation.delegated().as_str().as_bytes())
            .map_err(LmdbError::from)?;
        Ok(Some(delegation))
    }

    fn put_developer_settings(&mut self, settings: &DeveloperSettings) -> Result<(), StoreError> {
        let dbs = self.dbs;
        self.put(dbs.settings, DEVELOPER_SETTINGS_KEY, settings)
    }

    fn insert_topic(&mut self, title: &str, description: &str) -> Result<Topic, StoreError> {
        let dbs = self.dbs;
        let topic = Topic {
            id: TopicId::new(self.next_id(LAST_TOPIC_KEY)?),
            title: title.to_string(),
            description: description.to_string(),
            is_open: false,
        };
        self.put(dbs.topics, &topic.id.to_be_bytes(), &topic)?;
        Ok(topic)
    }

    fn put_topic(&mut self, topic: &Topic) -> Result<(), StoreError> {
        let dbs = self.dbs;
        let key = topic.id.to_be_bytes();
        if dbs
            .topics
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("topic {}", topic.id)));
        }
        self.put(dbs.topics, &key, topic)
    }

    fn insert_option(&mut self, topic: TopicId, label: &str) -> Result<BallotOption, StoreError> {
        let dbs = self.dbs;
        let option = BallotOption {
            id: OptionId::new(self.next_id(LAST_OPTION_KEY)?),
            topic_id: topic,
            label: label.to_string(),
        };
        self.put(dbs.options, &option.id.to_be_bytes(), &option)?;
        Ok(option)
    }

    fn append_vote(&mut self, record: &VoteRecord) -> Result<(), StoreError> {
        let dbs = self.dbs;
        let index_key = vote_index_key(&record.identity, record.topic_id);
        if dbs
            .vote_index
            .get(&self.txn, &index_key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "vote of {} on topic {}",
                record.identity, record.topic_id
            )));
        }

        let expected = match dbs.votes.last(&self.txn).map_err(LmdbError::from)? {
            Some((key, _)) => VoteId::new(decode_id(key)?).next(),
            None => VoteId::new(1),
        };
        if record.id != expected {
            return Err(StoreError::Conflict(format!(
                "vote id {} does not follow chain head (expected {expected})",
                record.id
            )));
        }

        let id_key = record.id.to_be_bytes();
        self.put(dbs.votes, &id_key, record)?;
        dbs.vote_index
            .put(&mut self.txn, &index_key, &id_key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let dbs = self.dbs;
        for db in [
            dbs.registrations,
            dbs.delegations,
            dbs.delegation_index,
            dbs.settings,
            dbs.topics,
            dbs.options,
            dbs.votes,
            dbs.vote_index,
        ] {
            db.clear(&mut self.txn).map_err(LmdbError::from)?;
        }
        Ok(())
    }
}
