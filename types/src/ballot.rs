//! Topics and their options.

use serde::{Deserialize, Serialize};

use crate::{OptionId, TopicId};

/// A question put to the vote.
///
/// Options can only be added while `is_open` is false.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub is_open: bool,
}

/// A selectable answer belonging to one topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotOption {
    pub id: OptionId,
    pub topic_id: TopicId,
    pub label: String,
}
