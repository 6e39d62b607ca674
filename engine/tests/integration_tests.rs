//! End-to-end behaviour of the voting engine over the in-memory store:
//! registration, both delegation kinds, weight resolution, vote casting,
//! chain verification and tallies.

use ballot_engine::{EngineConfig, Eligibility, VotingEngine};
use ballot_nullables::{NullClock, NullRoster, NullStore};
use ballot_types::{
    BallotError, ChainHash, DeveloperSettings, Identity, OptionId, TopicId, VoteId,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Engine = VotingEngine<NullStore, NullRoster, NullClock>;

fn id(token: &str) -> Identity {
    Identity::parse(token).unwrap()
}

fn engine_with(members: &[&str]) -> Engine {
    VotingEngine::new(
        NullStore::new(),
        NullRoster::with_members(members.iter().copied()),
        NullClock::ticking(1_700_000_000_000, 1_000),
        EngineConfig::default(),
    )
}

/// An open topic with two options.
fn open_topic(engine: &Engine) -> (TopicId, OptionId, OptionId) {
    let topic = engine.create_topic("Roof repair", "Approve the budget").unwrap();
    let yes = engine.add_option(topic.id, "Yes").unwrap();
    let no = engine.add_option(topic.id, "No").unwrap();
    engine.set_topic_open(topic.id, true).unwrap();
    (topic.id, yes.id, no.id)
}

fn developer_settings(active: bool, base_weight: u64, declared: u64) -> DeveloperSettings {
    DeveloperSettings {
        active,
        base_weight,
        declared_proxy_count: declared,
        comment: "builder".into(),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn owner_delegation_scenario() {
    let engine = engine_with(&["A", "B", "C"]);
    let (topic, yes, _) = open_topic(&engine);
    for voter in ["A", "B", "C"] {
        engine.register(&id(voter), 0).unwrap();
    }

    engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    assert_eq!(engine.resolve_weight(&id("B")).unwrap(), 0);
    assert_eq!(engine.resolve_weight(&id("A")).unwrap(), 2);
    assert_eq!(
        engine.cast_vote(topic, &id("B"), yes),
        Err(BallotError::NotEligible(id("B")))
    );
    assert_eq!(
        engine.eligibility(&id("B")).unwrap(),
        Eligibility::RepresentedBy { primary: id("A") }
    );
}

#[test]
fn numeric_proxies_scenario() {
    let engine = engine_with(&["A", "B", "C"]);
    let (topic, yes, no) = open_topic(&engine);

    engine.register(&id("C"), 3).unwrap();
    assert_eq!(engine.resolve_weight(&id("C")).unwrap(), 4);

    let record = engine.cast_vote(topic, &id("C"), yes).unwrap();
    assert_eq!(record.weight, 4);
    assert_eq!(record.id, VoteId::new(1));
    assert_eq!(record.prev_hash, ChainHash::GENESIS);

    assert_eq!(
        engine.cast_vote(topic, &id("C"), no),
        Err(BallotError::DuplicateVote {
            topic,
            identity: id("C")
        })
    );
}

#[test]
fn developer_weight_scenario() {
    let engine = engine_with(&["A", "B", "X"]);
    engine
        .set_developer_settings(&developer_settings(true, 5, 2))
        .unwrap();
    engine.add_developer_delegation(&id("X"), "linked unit").unwrap();

    assert_eq!(engine.resolve_weight(&Identity::Developer).unwrap(), 8);
    let breakdown = engine.developer_weight().unwrap();
    assert_eq!(breakdown.declared_proxy_count, 2);
    assert_eq!(breakdown.linked_count, 1);
    assert_eq!(breakdown.total, 8);
    assert_eq!(
        engine.eligibility(&id("X")).unwrap(),
        Eligibility::AbsorbedByDeveloper
    );

    // DEVELOPER needs no registration row to vote.
    let (topic, yes, _) = open_topic(&engine);
    let record = engine.cast_vote(topic, &Identity::Developer, yes).unwrap();
    assert_eq!(record.weight, 8);
}

#[test]
fn inactive_developer_cannot_vote() {
    let engine = engine_with(&["X"]);
    engine
        .set_developer_settings(&developer_settings(false, 5, 2))
        .unwrap();
    let (topic, yes, _) = open_topic(&engine);
    assert_eq!(engine.resolve_weight(&Identity::Developer).unwrap(), 0);
    assert_eq!(
        engine.eligibility(&Identity::Developer).unwrap(),
        Eligibility::DeveloperInactive
    );
    assert_eq!(
        engine.cast_vote(topic, &Identity::Developer, yes),
        Err(BallotError::NotEligible(Identity::Developer))
    );
}

#[test]
fn tampered_middle_record_is_detected() {
    let engine = engine_with(&["A", "B", "C"]);
    let (topic, yes, _) = open_topic(&engine);
    let mut ids = Vec::new();
    for voter in ["A", "B", "C"] {
        engine.register(&id(voter), 0).unwrap();
        ids.push(engine.cast_vote(topic, &id(voter), yes).unwrap().id);
    }
    assert!(engine.verify_chain().unwrap().valid);

    // Field edited in place: the record's own hash no longer matches.
    assert!(engine.store().tamper_vote(ids[1], |r| r.weight = 50));
    let result = engine.verify_chain().unwrap();
    assert!(!result.valid);
    assert_eq!(result.first_bad_record_id, Some(ids[1]));
    assert_eq!(
        engine.ensure_chain_intact(),
        Err(BallotError::IntegrityViolation { record: ids[1] })
    );
}

#[test]
fn rehashed_tamper_breaks_successor_link() {
    let engine = engine_with(&["A", "B", "C"]);
    let (topic, yes, _) = open_topic(&engine);
    let mut ids = Vec::new();
    for voter in ["A", "B", "C"] {
        engine.register(&id(voter), 0).unwrap();
        ids.push(engine.cast_vote(topic, &id(voter), yes).unwrap().id);
    }

    // The editor also recomputes the middle hash; the successor's prev_hash
    // still points at the original.
    engine.store().tamper_vote(ids[1], |r| {
        r.weight = 50;
        r.hash = ballot_ledger::recompute_hash(r);
    });
    let result = engine.verify_chain().unwrap();
    assert_eq!(result.first_bad_record_id, Some(ids[2]));
    assert_eq!(engine.stats()["integrity_failures"], 1);
}

// ---------------------------------------------------------------------------
// Cast preconditions
// ---------------------------------------------------------------------------

#[test]
fn cast_preconditions_in_order() {
    let engine = engine_with(&["A", "B"]);
    let topic = engine.create_topic("Fence", "").unwrap();
    let yes = engine.add_option(topic.id, "Yes").unwrap();
    let other = engine.create_topic("Pool", "").unwrap();
    let foreign = engine.add_option(other.id, "Maybe").unwrap();

    // closed topic
    assert_eq!(
        engine.cast_vote(topic.id, &id("A"), yes.id),
        Err(BallotError::TopicClosed(topic.id))
    );
    assert_eq!(
        engine.cast_vote(TopicId::new(99), &id("A"), yes.id),
        Err(BallotError::TopicClosed(TopicId::new(99)))
    );

    engine.set_topic_open(topic.id, true).unwrap();
    assert_eq!(
        engine.cast_vote(topic.id, &id("A"), foreign.id),
        Err(BallotError::InvalidOption {
            topic: topic.id,
            option: foreign.id
        })
    );

    // unregistered, but weight resolves to 1
    assert_eq!(
        engine.cast_vote(topic.id, &id("A"), yes.id),
        Err(BallotError::NotRegistered(id("A")))
    );
    engine.register(&id("A"), 0).unwrap();
    engine.cast_vote(topic.id, &id("A"), yes.id).unwrap();

    // a repeat vote is a duplicate even once the voter's weight drops to zero
    engine
        .set_developer_settings(&developer_settings(true, 3, 0))
        .unwrap();
    assert_eq!(
        engine
            .cast_vote(topic.id, &Identity::Developer, yes.id)
            .unwrap()
            .weight,
        3
    );
    engine
        .set_developer_settings(&developer_settings(false, 3, 0))
        .unwrap();
    assert_eq!(engine.resolve_weight(&Identity::Developer).unwrap(), 0);
    assert_eq!(
        engine.cast_vote(topic.id, &Identity::Developer, yes.id),
        Err(BallotError::DuplicateVote {
            topic: topic.id,
            identity: Identity::Developer
        })
    );
    assert_eq!(engine.stats()["votes_rejected"], 5);
    assert_eq!(engine.stats()["votes_cast"], 2);
}

#[test]
fn failed_cast_leaves_no_record() {
    let engine = engine_with(&["A"]);
    let (topic, yes, _) = open_topic(&engine);
    assert!(engine.cast_vote(topic, &id("A"), yes).is_err());
    assert!(engine.votes().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Registration and delegation
// ---------------------------------------------------------------------------

#[test]
fn register_requires_roster_membership() {
    let engine = engine_with(&["A"]);
    assert_eq!(
        engine.register(&id("Z"), 1),
        Err(BallotError::UnknownIdentity(id("Z")))
    );
    engine.register(&Identity::Developer, 0).unwrap();
}

#[test]
fn register_is_idempotent_and_weights_stay_frozen() {
    let engine = engine_with(&["A"]);
    let (topic, yes, _) = open_topic(&engine);
    engine.register(&id("A"), 2).unwrap();
    engine.register(&id("A"), 2).unwrap();
    assert_eq!(engine.registrations().unwrap().len(), 1);

    let record = engine.cast_vote(topic, &id("A"), yes).unwrap();
    engine.register(&id("A"), 7).unwrap();
    engine.register(&id("A"), 7).unwrap();
    assert_eq!(engine.registration(&id("A")).unwrap().unwrap().numeric_proxies, 7);
    assert_eq!(engine.votes().unwrap(), vec![record.clone()]);
    assert_eq!(engine.tallies(topic).unwrap()[&yes], record.weight);
}

#[test]
fn delegation_after_vote_rejected() {
    let engine = engine_with(&["A", "B"]);
    let (topic, yes, _) = open_topic(&engine);
    engine.register(&id("B"), 0).unwrap();
    engine.cast_vote(topic, &id("B"), yes).unwrap();
    assert_eq!(
        engine.add_owner_delegation(&id("A"), &id("B")),
        Err(BallotError::AlreadyVoted(id("B")))
    );
    assert_eq!(
        engine.add_developer_delegation(&id("B"), ""),
        Err(BallotError::AlreadyVoted(id("B")))
    );
    assert!(engine.delegations().unwrap().is_empty());
}

#[test]
fn removing_delegation_keeps_cast_weight() {
    let engine = engine_with(&["A", "B"]);
    let (topic, yes, _) = open_topic(&engine);
    engine.register(&id("A"), 0).unwrap();
    let edge = engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    let record = engine.cast_vote(topic, &id("A"), yes).unwrap();
    assert_eq!(record.weight, 2);

    engine.remove_delegation(edge).unwrap();
    assert_eq!(engine.resolve_weight(&id("A")).unwrap(), 1);
    assert_eq!(engine.tallies(topic).unwrap()[&yes], 2);
    assert!(engine.verify_chain().unwrap().valid);

    // unknown id is a no-op
    engine.remove_delegation(edge).unwrap();
}

#[test]
fn developer_delegation_guards() {
    let engine = engine_with(&["A", "B"]);
    engine.register(&id("A"), 2).unwrap();
    assert_eq!(
        engine.add_developer_delegation(&id("A"), ""),
        Err(BallotError::AlreadyDelegated(id("A")))
    );
    assert!(matches!(
        engine.add_developer_delegation(&Identity::Developer, ""),
        Err(BallotError::InvalidDelegation(_))
    ));
    engine.add_developer_delegation(&id("B"), "").unwrap();
    assert_eq!(
        engine.add_developer_delegation(&id("B"), ""),
        Err(BallotError::AlreadyDelegated(id("B")))
    );
}

// ---------------------------------------------------------------------------
// Topics, tallies and reports
// ---------------------------------------------------------------------------

#[test]
fn options_locked_while_open() {
    let engine = engine_with(&[]);
    let (topic, _, _) = open_topic(&engine);
    assert_eq!(
        engine.add_option(topic, "Abstain"),
        Err(BallotError::BallotLocked(topic))
    );
    engine.set_topic_open(topic, false).unwrap();
    engine.add_option(topic, "Abstain").unwrap();
    assert_eq!(engine.options(topic).unwrap().len(), 3);

    assert_eq!(
        engine.add_option(TopicId::new(42), "x"),
        Err(BallotError::UnknownTopic(TopicId::new(42)))
    );
    assert!(matches!(
        engine.add_option(topic, "   "),
        Err(BallotError::MalformedInput(_))
    ));
    assert!(matches!(
        engine.create_topic("", ""),
        Err(BallotError::MalformedInput(_))
    ));
}

#[test]
fn tallies_sum_frozen_weights() {
    let engine = engine_with(&["A", "B", "C", "D"]);
    let (topic, yes, no) = open_topic(&engine);
    engine.register(&id("A"), 1).unwrap();
    engine.register(&id("B"), 0).unwrap();
    engine.register(&id("C"), 0).unwrap();
    engine.add_owner_delegation(&id("C"), &id("D")).unwrap();

    engine.cast_vote(topic, &id("A"), yes).unwrap();
    engine.cast_vote(topic, &id("B"), no).unwrap();
    engine.cast_vote(topic, &id("C"), no).unwrap();

    let tally = engine.tallies(topic).unwrap();
    assert_eq!(tally[&yes], 2);
    assert_eq!(tally[&no], 3);
    assert_eq!(
        engine.tallies(TopicId::new(9)),
        Err(BallotError::UnknownTopic(TopicId::new(9)))
    );
}

#[test]
fn chain_spans_topics() {
    let engine = engine_with(&["A"]);
    engine.register(&id("A"), 0).unwrap();
    let (first, yes1, _) = open_topic(&engine);
    let (second, yes2, _) = open_topic(&engine);
    let a = engine.cast_vote(first, &id("A"), yes1).unwrap();
    let b = engine.cast_vote(second, &id("A"), yes2).unwrap();
    assert_eq!(b.prev_hash, a.hash);
    assert!(b.timestamp > a.timestamp);
}

#[test]
fn quorum_report_totals() {
    let engine = engine_with(&["A", "B", "C"]);
    engine.register(&id("A"), 1).unwrap();
    engine.register(&id("B"), 0).unwrap();
    engine.register(&id("C"), 0).unwrap();
    engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    engine
        .set_developer_settings(&developer_settings(true, 2, 0))
        .unwrap();

    let report = engine.quorum_report().unwrap();
    assert_eq!(report.rows.len(), 4);
    assert_eq!(report.total_weight, 3 + 1 + 2);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["rows"][1]["eligibility"]["status"], "represented_by");
}

#[test]
fn reset_clears_everything() {
    let engine = engine_with(&["A", "B"]);
    let (topic, yes, _) = open_topic(&engine);
    engine.register(&id("A"), 0).unwrap();
    engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    engine.cast_vote(topic, &id("A"), yes).unwrap();

    engine.reset().unwrap();
    assert!(engine.topics().unwrap().is_empty());
    assert!(engine.votes().unwrap().is_empty());
    assert!(engine.delegations().unwrap().is_empty());
    assert!(engine.registration(&id("A")).unwrap().is_none());
    assert_eq!(engine.verify_chain().unwrap().records_checked, 0);
    // roster untouched
    engine.register(&id("B"), 0).unwrap();
}

#[test]
fn ids_are_not_reissued_after_reset() {
    let engine = engine_with(&["A", "B"]);
    let topic_before = engine.create_topic("Budget", "").unwrap().id;
    let before = engine.add_owner_delegation(&id("A"), &id("B")).unwrap();

    engine.reset().unwrap();
    engine.register(&id("A"), 0).unwrap();
    let after = engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    assert_ne!(before, after);
    assert_ne!(engine.create_topic("Budget", "").unwrap().id, topic_before);

    // the handle from before the reset names nothing now
    engine.remove_delegation(before).unwrap();
    assert_eq!(engine.delegations().unwrap().len(), 1);
    assert_eq!(engine.resolve_weight(&id("B")).unwrap(), 0);
    assert_eq!(engine.resolve_weight(&id("A")).unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Retry discipline
// ---------------------------------------------------------------------------

#[test]
fn transient_conflicts_are_retried() {
    let engine = engine_with(&["A"]);
    engine.store().inject_conflicts(2);
    engine.register(&id("A"), 1).unwrap();
    assert_eq!(engine.store().pending_conflicts(), 0);
    assert_eq!(engine.stats()["commit_retries"], 2);
    assert_eq!(engine.registration(&id("A")).unwrap().unwrap().numeric_proxies, 1);
}

#[test]
fn retries_are_bounded() {
    let engine = VotingEngine::new(
        NullStore::new(),
        NullRoster::with_members(["A"]),
        NullClock::new(0),
        EngineConfig {
            max_commit_retries: 1,
        },
    );
    engine.store().inject_conflicts(5);
    assert!(matches!(
        engine.register(&id("A"), 1),
        Err(BallotError::StoreConflict(_))
    ));
    assert_eq!(engine.store().pending_conflicts(), 3);
    assert!(engine.registration(&id("A")).unwrap().is_none());
}

#[test]
fn retried_cast_appends_once() {
    let engine = engine_with(&["A"]);
    let (topic, yes, _) = open_topic(&engine);
    engine.register(&id("A"), 0).unwrap();
    engine.store().inject_conflicts(1);
    let record = engine.cast_vote(topic, &id("A"), yes).unwrap();
    assert_eq!(record.id, VoteId::new(1));
    assert_eq!(engine.votes().unwrap().len(), 1);
    assert!(engine.verify_chain().unwrap().valid);
}
