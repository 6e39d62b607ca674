//! Blake2b hashing for the vote chain.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ballot_types::{ChainHash, Identity, OptionId, Timestamp, TopicId};

type Blake2b256 = Blake2b<U32>;

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// The ordered tuple a vote record's hash commits to.
#[derive(Clone, Copy, Debug)]
pub struct VoteDigestInput<'a> {
    pub prev_hash: &'a ChainHash,
    pub identity: &'a Identity,
    pub topic_id: TopicId,
    pub option_id: OptionId,
    pub weight: u64,
    pub timestamp: Timestamp,
}

/// Digest of `(prev_hash, identity, topic_id, option_id, weight, timestamp)`.
///
/// The identity is length-prefixed so no two distinct tuples share an encoding.
pub fn vote_digest(input: VoteDigestInput<'_>) -> ChainHash {
    let identity = input.identity.as_str().as_bytes();
    let identity_len = (identity.len() as u32).to_be_bytes();
    ChainHash::new(blake2b_256_multi(&[
        input.prev_hash.as_bytes(),
        &identity_len,
        identity,
        &input.topic_id.to_be_bytes(),
        &input.option_id.to_be_bytes(),
        &input.weight.to_be_bytes(),
        &input.timestamp.as_millis().to_be_bytes(),
    ]))
}
