//! Weighted result aggregation.

use ballot_types::{BallotOption, OptionId, VoteRecord};
use std::collections::BTreeMap;

/// Sum of frozen weights per option.
pub type Tally = BTreeMap<OptionId, u64>;

/// Tally `votes` over `options`. Every option appears, with zero if unvoted;
/// votes for options not listed are ignored.
pub fn tally<'a>(
    options: &[BallotOption],
    votes: impl IntoIterator<Item = &'a VoteRecord>,
) -> Tally {
    let mut totals: Tally = options.iter().map(|o| (o.id, 0)).collect();
    for vote in votes {
        if let Some(total) = totals.get_mut(&vote.option_id) {
            *total = total.saturating_add(vote.weight);
        }
    }
    totals
}
