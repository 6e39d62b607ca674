//! The engine over the durable LMDB backend.

use std::path::Path;

use ballot_engine::{EngineConfig, VotingEngine};
use ballot_store_lmdb::{LmdbRoster, LmdbStore};
use ballot_types::{BallotError, Identity, SystemClock};

fn id(token: &str) -> Identity {
    Identity::parse(token).unwrap()
}

fn open(path: &Path) -> VotingEngine<LmdbStore, LmdbRoster> {
    let store = LmdbStore::open(path, 16 * 1024 * 1024).unwrap();
    let roster = store.roster();
    VotingEngine::new(store, roster, SystemClock, EngineConfig::default())
}

#[test]
fn votes_persist_and_verify_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    let (topic, yes) = {
        let engine = open(dir.path());
        engine
            .roster()
            .add(&[id("A"), id("B"), id("C")])
            .unwrap();
        let topic = engine.create_topic("Garden", "Replant").unwrap();
        let yes = engine.add_option(topic.id, "Yes").unwrap();
        engine.set_topic_open(topic.id, true).unwrap();
        engine.register(&id("A"), 0).unwrap();
        engine.register(&id("C"), 3).unwrap();
        engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
        engine.cast_vote(topic.id, &id("A"), yes.id).unwrap();
        (topic.id, yes.id)
    };

    let engine = open(dir.path());
    assert_eq!(engine.resolve_weight(&id("A")).unwrap(), 2);
    assert_eq!(
        engine.cast_vote(topic, &id("A"), yes),
        Err(BallotError::DuplicateVote {
            topic,
            identity: id("A")
        })
    );
    let record = engine.cast_vote(topic, &id("C"), yes).unwrap();
    assert_eq!(record.weight, 4);
    assert_eq!(engine.tallies(topic).unwrap()[&yes], 6);
    assert!(engine.ensure_chain_intact().is_ok());
}

#[test]
fn reset_keeps_roster() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path());
    engine.roster().add(&[id("A")]).unwrap();
    engine.register(&id("A"), 2).unwrap();
    engine.reset().unwrap();
    assert!(engine.registration(&id("A")).unwrap().is_none());
    engine.register(&id("A"), 1).unwrap();
}

#[test]
fn delegations_check_roster_and_survive_reset() {
    let dir = tempfile::tempdir().unwrap();
    let engine = open(dir.path());
    engine.roster().add(&[id("A"), id("B"), id("C")]).unwrap();

    assert_eq!(
        engine.add_owner_delegation(&id("A"), &id("Z")),
        Err(BallotError::UnknownIdentity(id("Z")))
    );
    assert_eq!(
        engine.add_developer_delegation(&id("Z"), ""),
        Err(BallotError::UnknownIdentity(id("Z")))
    );
    let before = engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    engine.add_developer_delegation(&id("C"), "site office").unwrap();

    engine.reset().unwrap();
    let after = engine.add_owner_delegation(&id("A"), &id("B")).unwrap();
    assert!(after > before);
    engine.remove_delegation(before).unwrap();
    assert_eq!(engine.resolve_weight(&id("B")).unwrap(), 0);
}
