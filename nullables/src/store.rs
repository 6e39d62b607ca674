//! Nullable store: thread-safe in-memory storage for testing.
//!
//! A write transaction runs against a private copy of the state that replaces
//! the shared state only when the closure succeeds, so a failed operation
//! leaves no trace. The single mutex serialises writers the way LMDB does.

use ballot_store::{ReadTxn, Store, StoreError, WriteTxn};
use ballot_types::{
    BallotError, BallotOption, Delegation, DelegationId, DelegationKind, DeveloperSettings,
    Identity, OptionId, Registration, Topic, TopicId, VoteId, VoteRecord,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

#[derive(Clone, Default)]
struct State {
    registrations: BTreeMap<Identity, Registration>,
    delegations: BTreeMap<DelegationId, Delegation>,
    delegated: HashMap<Identity, DelegationId>,
    settings: DeveloperSettings,
    topics: BTreeMap<TopicId, Topic>,
    options: BTreeMap<OptionId, BallotOption>,
    votes: BTreeMap<VoteId, VoteRecord>,
    vote_index: HashMap<(TopicId, Identity), VoteId>,
    last_delegation: u64,
    last_topic: u64,
    last_option: u64,
}

/// An in-memory ballot store for testing.
#[derive(Default)]
pub struct NullStore {
    state: Mutex<State>,
    injected_conflicts: AtomicU32,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` write transactions fail at commit with a
    /// transient conflict.
    pub fn inject_conflicts(&self, count: u32) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// Conflicts injected but not yet consumed.
    pub fn pending_conflicts(&self) -> u32 {
        self.injected_conflicts.load(Ordering::SeqCst)
    }

    /// Mutate a stored vote record in place, bypassing the ledger.
    ///
    /// Returns false if no record has that id.
    pub fn tamper_vote(&self, id: VoteId, mutate: impl FnOnce(&mut VoteRecord)) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        match state.votes.get_mut(&id) {
            Some(record) => {
                mutate(record);
                true
            }
            None => false,
        }
    }

    fn take_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> BallotError {
    StoreError::Backend(format!("null store lock poisoned: {e}")).into()
}

impl Store for NullStore {
    fn read<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<R, BallotError>,
    {
        let state = self.state.lock().map_err(poisoned)?;
        f(&*state)
    }

    fn write<R, F>(&self, f: F) -> Result<R, BallotError>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<R, BallotError>,
    {
        let mut state = self.state.lock().map_err(poisoned)?;
        let mut staged = state.clone();
        let result = f(&mut staged)?;
        if self.take_conflict() {
            return Err(StoreError::Conflict("injected commit conflict".into()).into());
        }
        *state = staged;
        Ok(result)
    }
}

impl ReadTxn for State {
    fn registration(&self, identity: &Identity) -> Result<Option<Registration>, StoreError> {
        Ok(self.registrations.get(identity).cloned())
    }

    fn registrations(&self) -> Result<Vec<Registration>, StoreError> {
        Ok(self.registrations.values().cloned().collect())
    }

    fn delegations(&self) -> Result<Vec<Delegation>, StoreError> {
        Ok(self.delegations.values().cloned().collect())
    }

    fn delegation_of(&self, identity: &Identity) -> Result<Option<Delegation>, StoreError> {
        Ok(self
            .delegated
            .get(identity)
            .and_then(|id| self.delegations.get(id))
            .cloned())
    }

    fn developer_settings(&self) -> Result<DeveloperSettings, StoreError> {
        Ok(self.settings.clone())
    }

    fn topic(&self, id: TopicId) -> Result<Option<Topic>, StoreError> {
        Ok(self.topics.get(&id).cloned())
    }

    fn topics(&self) -> Result<Vec<Topic>, StoreError> {
        Ok(self.topics.values().cloned().collect())
    }

    fn option(&self, id: OptionId) -> Result<Option<BallotOption>, StoreError> {
        Ok(self.options.get(&id).cloned())
    }

    fn options_for(&self, topic: TopicId) -> Result<Vec<BallotOption>, StoreError> {
        Ok(self
            .options
            .values()
            .filter(|o| o.topic_id == topic)
            .cloned()
            .collect())
    }

    fn vote(&self, topic: TopicId, identity: &Identity) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self
            .vote_index
            .get(&(topic, identity.clone()))
            .and_then(|id| self.votes.get(id))
            .cloned())
    }

    fn has_voted(&self, identity: &Identity) -> Result<bool, StoreError> {
        Ok(self.vote_index.keys().any(|(_, voter)| voter == identity))
    }

    fn last_vote(&self) -> Result<Option<VoteRecord>, StoreError> {
        Ok(self.votes.values().next_back().cloned())
    }

    fn votes(&self) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self.votes.values().cloned().collect())
    }
}

impl WriteTxn for State {
    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn put_registration(&mut self, registration: &Registration) -> Result<(), StoreError> {
        self.registrations
            .insert(registration.identity.clone(), registration.clone());
        Ok(())
    }

    fn insert_delegation(&mut self, kind: DelegationKind) -> Result<DelegationId, StoreError> {
        let delegated = kind.delegated().clone();
        if self.delegated.contains_key(&delegated) {
            return Err(StoreError::Duplicate(format!("delegation of {delegated}")));
        }
        self.last_delegation += 1;
        let id = DelegationId::new(self.last_delegation);
        self.delegated.insert(delegated, id);
        self.delegations.insert(id, Delegation { id, kind });
        Ok(id)
    }

    fn remove_delegation(&mut self, id: DelegationId) -> Result<Option<Delegation>, StoreError> {
        let removed = self.delegations.remove(&id);
        if let Some(delegation) = &removed {
            self.delegated.remove(delegation.delegated());
        }
        Ok(removed)
    }

    fn put_developer_settings(&mut self, settings: &DeveloperSettings) -> Result<(), StoreError> {
        self.settings = settings.clone();
        Ok(())
    }

    fn insert_topic(&mut self, title: &str, description: &str) -> Result<Topic, StoreError> {
        self.last_topic += 1;
        let topic = Topic {
            id: TopicId::new(self.last_topic),
            title: title.to_string(),
            description: description.to_string(),
            is_open: false,
        };
        self.topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    fn put_topic(&mut self, topic: &Topic) -> Result<(), StoreError> {
        if !self.topics.contains_key(&topic.id) {
            return Err(StoreError::NotFound(format!("topic {}", topic.id)));
        }
        self.topics.insert(topic.id, topic.clone());
        Ok(())
    }

    fn insert_option(&mut self, topic: TopicId, label: &str) -> Result<BallotOption, StoreError> {
        self.last_option += 1;
        let option = BallotOption {
            id: OptionId::new(self.last_option),
            topic_id: topic,
            label: label.to_string(),
        };
        self.options.insert(option.id, option.clone());
        Ok(option)
    }

    fn append_vote(&mut self, record: &VoteRecord) -> Result<(), StoreError> {
        let key = (record.topic_id, record.identity.clone());
        if self.vote_index.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "vote of {} on topic {}",
                record.identity, record.topic_id
            )));
        }
        let expected = self
            .votes
            .keys()
            .next_back()
            .map(VoteId::next)
            .unwrap_or(VoteId::new(1));
        if record.id != expected {
            return Err(StoreError::Conflict(format!(
                "vote id {} does not follow chain head (expected {expected})",
                record.id
            )));
        }
        self.vote_index.insert(key, record.id);
        self.votes.insert(record.id, record.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        *self = State {
            last_delegation: self.last_delegation,
            last_topic: self.last_topic,
            last_option: self.last_option,
            ..State::default()
        };
        Ok(())
    }
}
