//! Error taxonomy returned by every ballot operation.

use thiserror::Error;

use crate::{Identity, OptionId, TopicId, VoteId};

/// Every failure a caller of the voting core can observe.
///
/// All variants are recoverable by the caller except
/// [`BallotError::IntegrityViolation`], which needs an operator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BallotError {
    #[error("identity {0} is not on the roster")]
    UnknownIdentity(Identity),

    #[error("invalid delegation: {0}")]
    InvalidDelegation(String),

    #[error("identity {0} is already delegated")]
    AlreadyDelegated(Identity),

    #[error("identity {0} has already voted")]
    AlreadyVoted(Identity),

    #[error("topic {0} is not open for voting")]
    TopicClosed(TopicId),

    #[error("option {option} does not belong to topic {topic}")]
    InvalidOption { topic: TopicId, option: OptionId },

    #[error("identity {identity} has already voted on topic {topic}")]
    DuplicateVote { topic: TopicId, identity: Identity },

    #[error("identity {0} has no voting weight")]
    NotEligible(Identity),

    #[error("identity {0} is not registered")]
    NotRegistered(Identity),

    #[error("vote chain integrity violated at record {record}")]
    IntegrityViolation { record: VoteId },

    #[error("topic {0} not found")]
    UnknownTopic(TopicId),

    #[error("topic {0} is open; its ballot is locked")]
    BallotLocked(TopicId),

    #[error("malformed identity: {0:?}")]
    MalformedIdentity(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("store conflict: {0}")]
    StoreConflict(String),
}

impl BallotError {
    /// Whether the operation may succeed if simply attempted again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreConflict(_))
    }
}
