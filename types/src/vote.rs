//! Vote records as stored in the ledger.

use serde::{Deserialize, Serialize};

use crate::{ChainHash, Identity, OptionId, Timestamp, TopicId, VoteId};

/// A cast vote. Immutable once appended.
///
/// `weight` is frozen at cast time. `prev_hash` is the `hash` of the record
/// with the preceding id, or [`ChainHash::GENESIS`] for the first record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: VoteId,
    pub topic_id: TopicId,
    pub identity: Identity,
    pub option_id: OptionId,
    pub weight: u64,
    pub prev_hash: ChainHash,
    pub hash: ChainHash,
    pub timestamp: Timestamp,
}
