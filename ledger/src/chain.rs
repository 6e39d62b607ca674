//! Appending votes to the chain.

use ballot_crypto::{vote_digest, VoteDigestInput};
use ballot_delegation::WeightResolver;
use ballot_store::{StoreError, WriteTxn};
use ballot_types::{
    BallotError, ChainHash, Identity, OptionId, Timestamp, TopicId, VoteId, VoteRecord,
};

/// A caller's request to vote; the identity is already authenticated.
#[derive(Clone, Debug)]
pub struct CastRequest {
    pub topic_id: TopicId,
    pub identity: Identity,
    pub option_id: OptionId,
}

/// Build the record that follows `previous` in the chain.
pub fn link_record(
    previous: Option<&VoteRecord>,
    request: &CastRequest,
    weight: u64,
    timestamp: Timestamp,
) -> VoteRecord {
    let (id, prev_hash) = match previous {
        Some(prev) => (prev.id.next(), prev.hash),
        None => (VoteId::new(1), ChainHash::GENESIS),
    };
    let hash = vote_digest(VoteDigestInput {
        prev_hash: &prev_hash,
        identity: &request.identity,
        topic_id: request.topic_id,
        option_id: request.option_id,
        weight,
        timestamp,
    });
    VoteRecord {
        id,
        topic_id: request.topic_id,
        identity: request.identity.clone(),
        option_id: request.option_id,
        weight,
        prev_hash,
        hash,
        timestamp,
    }
}

/// Validate and append a vote inside `txn`.
///
/// Preconditions are checked in order, each with its own error: open topic,
/// option of that topic, no earlier vote for the pair, positive weight,
/// registration present (`DEVELOPER` exempt). The duplicate check and the
/// append share the transaction, and the store's uniqueness index backs it.
pub fn cast_vote(
    txn: &mut dyn WriteTxn,
    request: &CastRequest,
    now: Timestamp,
) -> Result<VoteRecord, BallotError> {
    let CastRequest {
        topic_id,
        identity,
        option_id,
    } = request;

    match txn.topic(*topic_id)? {
        Some(topic) if topic.is_open => {}
        _ => return Err(BallotError::TopicClosed(*topic_id)),
    }
    match txn.option(*option_id)? {
        Some(option) if option.topic_id == *topic_id => {}
        _ => {
            return Err(BallotError::InvalidOption {
                topic: *topic_id,
                option: *option_id,
            })
        }
    }
    if txn.vote(*topic_id, identity)?.is_some() {
        return Err(duplicate(request));
    }

    let registration = txn.registration(identity)?;
    let weight = WeightResolver::load(txn.as_read())?.resolve(identity, registration.as_ref());
    if weight == 0 {
        return Err(BallotError::NotEligible(identity.clone()));
    }
    if registration.is_none() && !identity.is_developer() {
        return Err(BallotError::NotRegistered(identity.clone()));
    }

    let record = link_record(txn.last_vote()?.as_ref(), request, weight, now);
    txn.append_vote(&record).map_err(|e| match e {
        StoreError::Duplicate(_) => duplicate(request),
        other => other.into(),
    })?;
    Ok(record)
}

fn duplicate(request: &CastRequest) -> BallotError {
    BallotError::DuplicateVote {
        topic: request.topic_id,
        identity: request.identity.clone(),
    }
}
