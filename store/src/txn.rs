//! Transactional access to ballot state.
//!
//! All reads inside one [`Store::read`] or [`Store::write`] call observe a
//! single consistent snapshot. A write closure's changes are committed only
//! when it returns `Ok`; any error leaves the store untouched.

use ballot_types::{
    BallotError, BallotOption, Delegation, DelegationId, DelegationKind, DeveloperSettings,
    Identity, OptionId, Registration, Topic, TopicId, VoteRecord,
};

use crate::StoreError;

/// Read access to a consistent snapshot.
pub trait ReadTxn {
    fn registration(&self, identity: &Identity) -> Result<Option<Registration>, StoreError>;

    /// All registrations, ordered by identity.
    fn registrations(&self) -> Result<Vec<Registration>, StoreError>;

    /// All delegations of both kinds, ordered by id.
    fn delegations(&self) -> Result<Vec<Delegation>, StoreError>;

    /// The delegation, if any, under which `identity` is the delegated party.
    fn delegation_of(&self, identity: &Identity) -> Result<Option<Delegation>, StoreError>;

    fn developer_settings(&self) -> Result<DeveloperSettings, StoreError>;

    fn topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError>;

    /// All topics, ordered by id.
    fn topics(&self) -> Result<Vec<Topic>, StoreError>;

    fn option(&self, id: OptionId) -> Result<Option<BallotOption>, StoreError>;

    /// Options of one topic, ordered by id.
    fn options_for(&self, topic: TopicId) -> Result<Vec<BallotOption>, StoreError>;

    fn vote(&self, topic: TopicId, identity: &Identity) -> Result<Option<VoteRecord>, StoreError>;

    /// Whether `identity` has a vote on any topic.
    fn has_voted(&self, identity: &Identity) -> Result<bool, StoreError>;

    /// The most recently appended vote (highest id).
    fn last_vote(&self) -> Result<Option<VoteRecord>, StoreError>;

    /// All votes in chain order (ascending id).
    fn votes(&self) -> Result<Vec<VoteRecord>, StoreError>;

    /// Votes of one topic in ascending id order.
    fn votes_for_topic(&self, topic: TopicId) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .votes()?
            .into_iter()
            .filter(|v| v.topic_id == topic)
            .collect())
    }
}

/// Write access inside a transaction.
pub trait WriteTxn: ReadTxn {
    /// View this transaction as a read snapshot that includes its own writes.
    fn as_read(&self) -> &dyn ReadTxn;

    /// Insert or replace the registration for `registration.identity`.
    fn put_registration(&mut self, registration: &Registration) -> Result<(), StoreError>;

    /// Insert a delegation and assign its id.
    ///
    /// Fails with [`StoreError::Duplicate`] if the delegated identity already
    /// has a delegation of either kind.
    fn insert_delegation(&mut self, kind: DelegationKind) -> Result<DelegationId, StoreError>;

    /// Remove a delegation, returning it if it existed.
    fn remove_delegation(&mut self, id: DelegationId) -> Result<Option<Delegation>, StoreError>;

    fn put_developer_settings(&mut self, settings: &DeveloperSettings) -> Result<(), StoreError>;

    /// Insert a closed topic and assign its id.
    fn insert_topic(&mut self, title: &str, description: &str) -> Result<Topic, StoreError>;

    fn put_topic(&mut self, topic: &Topic) -> Result<(), StoreError>;

    /// Insert an option for `topic` and assign its id.
    fn insert_option(&mut self, topic: TopicId, label: &str) -> Result<BallotOption, StoreError>;

    /// Append a vote record.
    ///
    /// Fails with [`StoreError::Duplicate`] if a vote for
    /// `(record.topic_id, record.identity)` exists, and with
    /// [`StoreError::Conflict`] if `record.id` does not directly follow the
    /// last stored id.
    fn append_vote(&mut self, record: &VoteRecord) -> Result<(), StoreError>;

    /// Remove every registration, delegation, setting, topic, option and vote.
    ///
    /// Delegation, topic and option id counters survive, so an id handed out
    /// before the clear never names a later entity. The vote chain restarts
    /// from genesis.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// A transactional store handle.
///
/// Writers are serialised: two `write` calls never interleave their
/// read-check-append sequences.
pub trait Store: Send + Sync {
    fn read<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R, BallotError>;

    fn write<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R, BallotError>;
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn read<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R, BallotError>,
    {
        (**self).read(f)
    }

    fn write<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R, BallotError>,
    {
        (**self).write(f)
    }
}
