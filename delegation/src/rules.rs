//! Invariants a new delegation must satisfy.
//!
//! Endpoint checks only consult the roster and run before the write
//! transaction opens; the roster is external and the core never mutates it.
//! State checks read the whole current state through the transaction they run
//! in, never just the two named endpoints: a vote cast or an edge added since
//! the caller last looked must be seen.

use ballot_store::{ReadTxn, Roster};
use ballot_types::{BallotError, Identity};

use crate::DelegationGraph;

fn require_member(roster: &dyn Roster, identity: &Identity) -> Result<(), BallotError> {
    if roster.exists(identity)? {
        Ok(())
    } else {
        Err(BallotError::UnknownIdentity(identity.clone()))
    }
}

fn require_not_voted(txn: &dyn ReadTxn, identity: &Identity) -> Result<(), BallotError> {
    if txn.has_voted(identity)? {
        Err(BallotError::AlreadyVoted(identity.clone()))
    } else {
        Ok(())
    }
}

/// Endpoints of an owner delegation: distinct, both on the roster, and
/// `DEVELOPER` only as the primary.
pub fn check_owner_endpoints(
    roster: &dyn Roster,
    primary: &Identity,
    delegate: &Identity,
) -> Result<(), BallotError> {
    if primary == delegate {
        return Err(BallotError::InvalidDelegation(format!(
            "{primary} cannot represent itself"
        )));
    }
    if delegate.is_developer() {
        return Err(BallotError::UnknownIdentity(delegate.clone()));
    }
    if !primary.is_developer() {
        require_member(roster, primary)?;
    }
    require_member(roster, delegate)
}

/// Validate `delegate` being represented by `primary` against stored state.
///
/// Delegation depth is one hop, so the primary must not itself be delegated
/// and the delegate must not already represent anyone.
pub fn check_owner_delegation(
    txn: &dyn ReadTxn,
    primary: &Identity,
    delegate: &Identity,
) -> Result<(), BallotError> {
    if txn.delegation_of(delegate)?.is_some() {
        return Err(BallotError::AlreadyDelegated(delegate.clone()));
    }
    require_not_voted(txn, delegate)?;

    let graph = DelegationGraph::load(txn)?;
    if graph.is_delegated(primary) {
        return Err(BallotError::InvalidDelegation(format!(
            "{primary} is itself delegated and cannot represent others"
        )));
    }
    if graph.delegate_count(delegate) > 0 {
        return Err(BallotError::InvalidDelegation(format!(
            "{delegate} already represents other identities"
        )));
    }
    Ok(())
}

/// An identity joining the developer pool must be a roster member other
/// than `DEVELOPER` itself.
pub fn check_developer_endpoint(
    roster: &dyn Roster,
    identity: &Identity,
) -> Result<(), BallotError> {
    if identity.is_developer() {
        return Err(BallotError::InvalidDelegation(
            "DEVELOPER cannot join its own pool".into(),
        ));
    }
    require_member(roster, identity)
}

/// Validate absorbing `identity` into the developer pool against stored state.
///
/// An identity holding numeric proxies may not join the pool: its proxies
/// would be counted on top of the developer total.
pub fn check_developer_delegation(
    txn: &dyn ReadTxn,
    identity: &Identity,
) -> Result<(), BallotError> {
    if txn.delegation_of(identity)?.is_some() {
        return Err(BallotError::AlreadyDelegated(identity.clone()));
    }
    if txn
        .registration(identity)?
        .is_some_and(|r| r.numeric_proxies > 0)
    {
        return Err(BallotError::AlreadyDelegated(identity.clone()));
    }
    require_not_voted(txn, identity)?;

    if DelegationGraph::load(txn)?.delegate_count(identity) > 0 {
        return Err(BallotError::InvalidDelegation(format!(
            "{identity} represents other identities"
        )));
    }
    Ok(())
}
