use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Observation, Warning, WarningCode};

use super::error::ConfidenceError;

/// Read-only snapshot mapping a lemma to the labels it has been promoted under.
///
/// Ordered maps keep iteration and serialization stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionIndex {
    lemmas: BTreeMap<String, BTreeSet<String>>,
}

impl CollisionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from historical observations; only promoted ones count.
    pub fn from_promoted<'a>(observations: impl IntoIterator<Item = &'a Observation>) -> Self {
        let mut index = Self::new();
        for obs in observations.into_iter().filter(|o| o.promoted) {
            index.insert(&obs.lemma, &obs.label_id);
        }
        index
    }

    pub fn insert(&mut self, lemma: impl Into<String>, label_id: impl Into<String>) {
        self.lemmas
            .entry(lemma.into())
            .or_default()
            .insert(label_id.into());
    }

    pub fn labels_for(&self, lemma: &str) -> Option<&BTreeSet<String>> {
        self.lemmas.get(lemma)
    }

    /// `1 / |labels(lemma) ∪ {label_id}|`. An unseen lemma, or one known only under
    /// `label_id`, yields `1.0`.
    pub fn penalty(&self, lemma: &str, label_id: &str) -> f64 {
        let distinct = match self.lemmas.get(lemma) {
            None => 1,
            Some(labels) if labels.contains(label_id) => labels.len(),
            Some(labels) => labels.len() + 1,
        };
        1.0 / distinct as f64
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl<L: Into<String>, S: Into<String>> FromIterator<(L, S)> for CollisionIndex {
    fn from_iter<I: IntoIterator<Item = (L, S)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (lemma, label) in iter {
            index.insert(lemma, label);
        }
        index
    }
}

/// External dictionary-management boundary supplying the per-run snapshot.
pub trait CollisionSource: Send + Sync {
    fn snapshot(&self) -> Result<CollisionIndex, ConfidenceError>;
}

impl CollisionSource for CollisionIndex {
    fn snapshot(&self) -> Result<CollisionIndex, ConfidenceError> {
        Ok(self.clone())
    }
}

/// Fetches a snapshot, degrading to an empty index when the source fails.
pub fn load_collision_index(source: &dyn CollisionSource) -> (CollisionIndex, Option<Warning>) {
    match source.snapshot() {
        Ok(index) => {
            debug!(lemmas = index.len(), "Collision index loaded");
            (index, None)
        }
        Err(e) => {
            warn!(error = %e, "Collision index unavailable, applying no collision penalty");
            let warning = Warning::new(
                WarningCode::CollisionIndexUnavailable,
                "collisionIndex",
                e.to_string(),
            );
            (CollisionIndex::new(), Some(warning))
        }
    }
}
