//! `VotingEngine`: every caller-facing operation.

use std::collections::BTreeMap;

use ballot_delegation::{
    check_developer_delegation, check_developer_endpoint, check_owner_delegation,
    check_owner_endpoints, DeveloperWeight, Eligibility, WeightResolver,
};
use ballot_ledger::{tally, verify_chain, CastRequest, Tally, VerificationResult};
use ballot_store::{Roster, Store, StoreError, WriteTxn};
use ballot_types::{
    BallotError, BallotOption, Clock, Delegation, DelegationId, DelegationKind, DeveloperSettings,
    Identity, OptionId, Registration, SystemClock, Topic, TopicId, VoteRecord,
};
use ballot_utils::StatsCounter;

use crate::{EngineConfig, QuorumReport};

const VOTES_CAST: &str = "votes_cast";
const VOTES_REJECTED: &str = "votes_rejected";
const DELEGATIONS_ADDED: &str = "delegations_added";
const DELEGATIONS_REMOVED: &str = "delegations_removed";
const REGISTRATIONS: &str = "registrations";
const COMMIT_RETRIES: &str = "commit_retries";
const CHAIN_VERIFICATIONS: &str = "chain_verifications";
const INTEGRITY_FAILURES: &str = "integrity_failures";

const COUNTERS: &[&str] = &[
    VOTES_CAST,
    VOTES_REJECTED,
    DELEGATIONS_ADDED,
    DELEGATIONS_REMOVED,
    REGISTRATIONS,
    COMMIT_RETRIES,
    CHAIN_VERIFICATIONS,
    INTEGRITY_FAILURES,
];

/// The voting core over an injected store, roster and clock.
///
/// Cheap to share behind an `Arc`: all methods take `&self`, and the store
/// serialises writers.
pub struct VotingEngine<S, R, C = SystemClock> {
    store: S,
    roster: R,
    clock: C,
    config: EngineConfig,
    stats: StatsCounter,
}

impl<S, R, C> VotingEngine<S, R, C>
where
    S: Store,
    R: Roster,
    C: Clock,
{
    pub fn new(store: S, roster: R, clock: C, config: EngineConfig) -> Self {
        Self {
            store,
            roster,
            clock,
            config,
            stats: StatsCounter::new(COUNTERS),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roster(&self) -> &R {
        &self.roster
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Operation counters since construction.
    pub fn stats(&self) -> BTreeMap<&'static str, u64> {
        self.stats.snapshot()
    }

    /// Run `f` in a write transaction, re-running it on transient conflicts.
    fn write<T, F>(&self, op: &'static str, f: F) -> Result<T, BallotError>
    where
        F: Fn(&mut dyn WriteTxn) -> Result<T, BallotError>,
    {
        let mut attempt = 0;
        loop {
            match self.store.write(|txn| f(txn)) {
                Err(e) if e.is_transient() && attempt < self.config.max_commit_retries => {
                    attempt += 1;
                    self.stats.increment(COMMIT_RETRIES);
                    tracing::warn!(op, attempt, error = %e, "store conflict, retrying");
                }
                Err(e) => {
                    tracing::debug!(op, error = %e, "request rejected");
                    return Err(e);
                }
                ok => return ok,
            }
        }
    }

    fn require_member(&self, identity: &Identity) -> Result<(), BallotError> {
        if identity.is_developer() || self.roster.exists(identity)? {
            Ok(())
        } else {
            tracing::debug!(%identity, "identity not on roster");
            Err(BallotError::UnknownIdentity(identity.clone()))
        }
    }

    // ── Registrations ───────────────────────────────────────────────────

    /// Insert or replace the numeric proxy count of `identity`.
    pub fn register(&self, identity: &Identity, numeric_proxies: u64) -> Result<(), BallotError> {
        self.require_member(identity)?;
        let registration = Registration::new(identity.clone(), numeric_proxies);
        self.write("register", |txn| Ok(txn.put_registration(&registration)?))?;
        self.stats.increment(REGISTRATIONS);
        tracing::info!(%identity, numeric_proxies, "registration stored");
        Ok(())
    }

    pub fn registration(&self, identity: &Identity) -> Result<Option<Registration>, BallotError> {
        self.store.read(|txn| Ok(txn.registration(identity)?))
    }

    pub fn registrations(&self) -> Result<Vec<Registration>, BallotError> {
        self.store.read(|txn| Ok(txn.registrations()?))
    }

    // ── Delegation ──────────────────────────────────────────────────────

    /// Let `primary` represent `delegate`.
    pub fn add_owner_delegation(
        &self,
        primary: &Identity,
        delegate: &Identity,
    ) -> Result<DelegationId, BallotError> {
        check_owner_endpoints(&self.roster, primary, delegate).inspect_err(|e| {
            tracing::debug!(%primary, %delegate, error = %e, "delegation rejected");
        })?;
        let id = self.write("add_owner_delegation", |txn| {
            check_owner_delegation(txn.as_read(), primary, delegate)?;
            txn.insert_delegation(DelegationKind::Owner {
                primary: primary.clone(),
                delegate: delegate.clone(),
            })
            .map_err(|e| already_delegated(e, delegate))
        })?;
        self.stats.increment(DELEGATIONS_ADDED);
        tracing::info!(%primary, %delegate, delegation = %id, "owner delegation added");
        Ok(id)
    }

    /// Absorb `identity` into the `DEVELOPER` aggregate.
    pub fn add_developer_delegation(
        &self,
        identity: &Identity,
        note: &str,
    ) -> Result<DelegationId, BallotError> {
        check_developer_endpoint(&self.roster, identity).inspect_err(|e| {
            tracing::debug!(%identity, error = %e, "delegation rejected");
        })?;
        let id = self.write("add_developer_delegation", |txn| {
            check_developer_delegation(txn.as_read(), identity)?;
            txn.insert_delegation(DelegationKind::Developer {
                identity: identity.clone(),
                note: note.to_string(),
            })
            .map_err(|e| already_delegated(e, identity))
        })?;
        self.stats.increment(DELEGATIONS_ADDED);
        tracing::info!(%identity, delegation = %id, "developer delegation added");
        Ok(id)
    }

    /// Remove a delegation of either kind. Unknown ids are a no-op. Votes
    /// already cast keep their frozen weight.
    pub fn remove_delegation(&self, id: DelegationId) -> Result<(), BallotError> {
        let removed = self.write("remove_delegation", |txn| Ok(txn.remove_delegation(id)?))?;
        match removed {
            Some(delegation) => {
                self.stats.increment(DELEGATIONS_REMOVED);
                tracing::info!(
                    delegation = %id,
                    delegated = %delegation.delegated(),
                    "delegation removed"
                );
            }
            None => tracing::debug!(delegation = %id, "no such delegation"),
        }
        Ok(())
    }

    pub fn delegations(&self) -> Result<Vec<Delegation>, BallotError> {
        self.store.read(|txn| Ok(txn.delegations()?))
    }

    pub fn set_developer_settings(&self, settings: &DeveloperSettings) -> Result<(), BallotError> {
        self.write("set_developer_settings", |txn| {
            Ok(txn.put_developer_settings(settings)?)
        })?;
        tracing::info!(
            active = settings.active,
            base_weight = settings.base_weight,
            declared_proxy_count = settings.declared_proxy_count,
            "developer settings updated"
        );
        Ok(())
    }

    pub fn developer_settings(&self) -> Result<DeveloperSettings, BallotError> {
        self.store.read(|txn| Ok(txn.developer_settings()?))
    }

    // ── Weights ─────────────────────────────────────────────────────────

    /// Current effective weight of `identity`. A point-in-time answer.
    pub fn resolve_weight(&self, identity: &Identity) -> Result<u64, BallotError> {
        self.store
            .read(|txn| Ok(WeightResolver::load(txn)?.resolve_in(txn, identity)?))
    }

    /// Whether `identity` may vote right now, and why not if it may not.
    pub fn eligibility(&self, identity: &Identity) -> Result<Eligibility, BallotError> {
        self.store.read(|txn| {
            let registration = txn.registration(identity)?;
            Ok(WeightResolver::load(txn)?.eligibility(identity, registration.as_ref()))
        })
    }

    pub fn developer_weight(&self) -> Result<DeveloperWeight, BallotError> {
        self.store
            .read(|txn| Ok(WeightResolver::load(txn)?.developer_weight()))
    }

    pub fn quorum_report(&self) -> Result<QuorumReport, BallotError> {
        self.store.read(|txn| {
            let resolver = WeightResolver::load(txn)?;
            Ok(QuorumReport::build(&resolver, &txn.registrations()?))
        })
    }

    // ── Topics ──────────────────────────────────────────────────────────

    /// Create a topic. It starts closed so options can be added.
    pub fn create_topic(&self, title: &str, description: &str) -> Result<Topic, BallotError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BallotError::MalformedInput("topic title is empty".into()));
        }
        let topic = self.write("create_topic", |txn| {
            Ok(txn.insert_topic(title, description.trim())?)
        })?;
        tracing::info!(topic = %topic.id, title, "topic created");
        Ok(topic)
    }

    /// Add an option to a closed topic.
    pub fn add_option(&self, topic_id: TopicId, label: &str) -> Result<BallotOption, BallotError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(BallotError::MalformedInput("option label is empty".into()));
        }
        let option = self.write("add_option", |txn| {
            match txn.topic(topic_id)? {
                None => Err(BallotError::UnknownTopic(topic_id)),
                Some(topic) if topic.is_open => Err(BallotError::BallotLocked(topic_id)),
                Some(_) => Ok(txn.insert_option(topic_id, label)?),
            }
        })?;
        tracing::info!(topic = %topic_id, option = %option.id, label, "option added");
        Ok(option)
    }

    /// Open or close voting on a topic.
    pub fn set_topic_open(&self, topic_id: TopicId, open: bool) -> Result<Topic, BallotError> {
        let topic = self.write("set_topic_open", |txn| {
            let mut topic = txn
                .topic(topic_id)?
                .ok_or(BallotError::UnknownTopic(topic_id))?;
            topic.is_open = open;
            txn.put_topic(&topic)?;
            Ok(topic)
        })?;
        tracing::info!(topic = %topic_id, open, "topic state changed");
        Ok(topic)
    }

    pub fn topics(&self) -> Result<Vec<Topic>, BallotError> {
        self.store.read(|txn| Ok(txn.topics()?))
    }

    pub fn options(&self, topic_id: TopicId) -> Result<Vec<BallotOption>, BallotError> {
        self.store.read(|txn| {
            if txn.topic(topic_id)?.is_none() {
                return Err(BallotError::UnknownTopic(topic_id));
            }
            Ok(txn.options_for(topic_id)?)
        })
    }

    // ── Ledger ──────────────────────────────────────────────────────────

    /// Cast `identity`'s vote. The weight is resolved and frozen in the same
    /// transaction that appends the record.
    pub fn cast_vote(
        &self,
        topic_id: TopicId,
        identity: &Identity,
        option_id: OptionId,
    ) -> Result<VoteRecord, BallotError> {
        let request = CastRequest {
            topic_id,
            identity: identity.clone(),
            option_id,
        };
        let result = self.write("cast_vote", |txn| {
            ballot_ledger::cast_vote(txn, &request, self.clock.now())
        });
        match &result {
            Ok(record) => {
                self.stats.increment(VOTES_CAST);
                tracing::info!(
                    vote = %record.id,
                    topic = %topic_id,
                    %identity,
                    weight = record.weight,
                    "vote cast"
                );
            }
            Err(_) => self.stats.increment(VOTES_REJECTED),
        }
        result
    }

    /// Walk the whole chain and report the first bad record, if any.
    pub fn verify_chain(&self) -> Result<VerificationResult, BallotError> {
        let result = self.store.read(|txn| Ok(verify_chain(txn)?))?;
        self.stats.increment(CHAIN_VERIFICATIONS);
        match result.first_bad_record_id {
            Some(record) => {
                self.stats.increment(INTEGRITY_FAILURES);
                tracing::warn!(%record, checked = result.records_checked, "vote chain is broken");
            }
            None => tracing::info!(checked = result.records_checked, "vote chain verified"),
        }
        Ok(result)
    }

    /// Like [`Self::verify_chain`], but a broken chain is an
    /// [`BallotError::IntegrityViolation`].
    pub fn ensure_chain_intact(&self) -> Result<VerificationResult, BallotError> {
        self.verify_chain()?.into_result()
    }

    /// Sum of frozen weights per option of `topic_id`.
    pub fn tallies(&self, topic_id: TopicId) -> Result<Tally, BallotError> {
        self.store.read(|txn| {
            if txn.topic(topic_id)?.is_none() {
                return Err(BallotError::UnknownTopic(topic_id));
            }
            let options = txn.options_for(topic_id)?;
            Ok(tally(&options, &txn.votes_for_topic(topic_id)?))
        })
    }

    pub fn votes(&self) -> Result<Vec<VoteRecord>, BallotError> {
        self.store.read(|txn| Ok(txn.votes()?))
    }

    // ── Administration ──────────────────────────────────────────────────

    /// Clear registrations, delegations, developer settings, topics, options
    /// and votes in one transaction. The roster is not touched, and ids
    /// issued before the reset are never reissued.
    pub fn reset(&self) -> Result<(), BallotError> {
        self.write("reset", |txn| Ok(txn.clear()?))?;
        tracing::warn!("ballot state reset");
        Ok(())
    }
}

fn already_delegated(e: StoreError, identity: &Identity) -> BallotError {
    match e {
        StoreError::Duplicate(_) => BallotError::AlreadyDelegated(identity.clone()),
        other => other.into(),
    }
}
