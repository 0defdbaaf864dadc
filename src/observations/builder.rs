use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::hashing::observation_uuid;
use crate::model::{CandidateCatalog, Observation, TopicAssignment};

use super::error::ObservationError;

/// How observation ids are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Fresh UUIDv4 per observation.
    #[default]
    Random,
    /// UUIDv5 over (message, label, candidate, dictionary version); replays reproduce ids.
    Deterministic,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "deterministic" => Ok(Self::Deterministic),
            other => Err(format!(
                "unknown observation id strategy '{}' (expected random or deterministic)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObservationBuilder {
    ids: IdStrategy,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_strategy(ids: IdStrategy) -> Self {
        Self { ids }
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.ids
    }

    /// One observation per (topic, resolved keyword), in topic then keyword order.
    ///
    /// Keyword metadata is read from `catalog`, not from the topic. `dict_version` and
    /// `observed_at` are the values frozen at run start.
    pub fn build(
        &self,
        message_id: &str,
        topics: &[TopicAssignment],
        catalog: &CandidateCatalog,
        dict_version: u32,
        observed_at: DateTime<Utc>,
    ) -> Result<Vec<Observation>, ObservationError> {
        let mut observations = Vec::new();

        for topic in topics {
            for keyword in &topic.keywords {
                let candidate = catalog.get(&keyword.candidate_id).ok_or_else(|| {
                    ObservationError::UnknownCandidate {
                        label_id: topic.label_id.clone(),
                        candidate_id: keyword.candidate_id.clone(),
                    }
                })?;

                let obs_id = match self.ids {
                    IdStrategy::Random => Uuid::new_v4(),
                    IdStrategy::Deterministic => observation_uuid(
                        message_id,
                        &topic.label_id,
                        &candidate.candidate_id,
                        dict_version,
                    ),
                };

                observations.push(Observation {
                    obs_id,
                    message_id: message_id.to_string(),
                    label_id: topic.label_id.clone(),
                    candidate_id: candidate.candidate_id.clone(),
                    lemma: candidate.lemma.clone(),
                    term: candidate.term.clone(),
                    count: candidate.count,
                    embedding_score: candidate.embedding_score,
                    dict_version,
                    promoted: false,
                    observed_at,
                });
            }
        }

        debug!(
            message_id = %message_id,
            observations = observations.len(),
            "Observations built"
        );
        Ok(observations)
    }
}
