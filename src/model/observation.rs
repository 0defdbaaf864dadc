use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only audit fact: a keyword observed under a label in one message.
///
/// Never mutated after creation. `dict_version` is frozen at run start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub obs_id: Uuid,
    pub message_id: String,
    pub label_id: String,
    pub candidate_id: String,
    pub lemma: String,
    pub term: String,
    pub count: u32,
    pub embedding_score: f64,
    pub dict_version: u32,
    pub promoted: bool,
    pub observed_at: DateTime<Utc>,
}
