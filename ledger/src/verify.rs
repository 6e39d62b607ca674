//! Chain verification.
//!
//! Walks the ledger in id order and, for every record, checks that its stored
//! `prev_hash` is the previous record's stored `hash` (genesis for the first)
//! and that its stored `hash` matches the digest recomputed from its fields.
//! The first failing record is reported. Nothing is ever repaired.

use ballot_crypto::{vote_digest, VoteDigestInput};
use ballot_store::{ReadTxn, StoreError};
use ballot_types::{BallotError, ChainHash, VoteId, VoteRecord};
use serde::Serialize;

/// Outcome of a full chain walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub first_bad_record_id: Option<VoteId>,
    pub records_checked: u64,
}

impl VerificationResult {
    /// Turn an invalid result into [`BallotError::IntegrityViolation`].
    pub fn into_result(self) -> Result<Self, BallotError> {
        match self.first_bad_record_id {
            Some(record) => Err(BallotError::IntegrityViolation { record }),
            None => Ok(self),
        }
    }
}

/// Digest a record's fields, trusting its stored `prev_hash`.
pub fn recompute_hash(record: &VoteRecord) -> ChainHash {
    vote_digest(VoteDigestInput {
        prev_hash: &record.prev_hash,
        identity: &record.identity,
        topic_id: record.topic_id,
        option_id: record.option_id,
        weight: record.weight,
        timestamp: record.timestamp,
    })
}

/// Verify records supplied in chain order.
pub fn verify_records<'a>(
    records: impl IntoIterator<Item = &'a VoteRecord>,
) -> VerificationResult {
    let mut expected_prev = ChainHash::GENESIS;
    let mut last_id: Option<VoteId> = None;
    let mut checked = 0u64;

    for record in records {
        checked += 1;
        let ordered = last_id.map_or(true, |last| record.id > last);
        if !ordered || record.prev_hash != expected_prev || recompute_hash(record) != record.hash {
            return VerificationResult {
                valid: false,
                first_bad_record_id: Some(record.id),
                records_checked: checked,
            };
        }
        expected_prev = record.hash;
        last_id = Some(record.id);
    }

    VerificationResult {
        valid: true,
        first_bad_record_id: None,
        records_checked: checked,
    }
}

/// Verify the whole ledger visible in `txn`.
pub fn verify_chain(txn: &dyn ReadTxn) -> Result<VerificationResult, StoreError> {
    Ok(verify_records(&txn.votes()?))
}
