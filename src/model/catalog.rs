use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::ModelError;

/// Where the candidate was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Subject,
    Body,
}

/// Keyword candidate produced upstream. The only trusted source of keyword metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(alias = "candidateid")]
    pub candidate_id: String,
    pub term: String,
    pub lemma: String,
    pub count: u32,
    pub source: CandidateSource,
    #[serde(alias = "embeddingscore")]
    pub embedding_score: f64,
    #[serde(alias = "score")]
    pub composite_score: f64,
}

impl Candidate {
    fn check(&self) -> Result<(), ModelError> {
        let invalid = |reason: &str| ModelError::InvalidCandidate {
            candidate_id: self.candidate_id.clone(),
            reason: reason.to_string(),
        };

        if self.candidate_id.is_empty() {
            return Err(invalid("empty candidate id"));
        }
        if self.count == 0 {
            return Err(invalid("count must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.embedding_score) {
            return Err(invalid("embedding score outside [0, 1]"));
        }
        if !self.composite_score.is_finite() {
            return Err(invalid("composite score is not finite"));
        }
        Ok(())
    }
}

/// Read-only per-message candidate snapshot, indexed by id.
///
/// Iteration order is the upstream order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Candidate>", into = "Vec<Candidate>")]
pub struct CandidateCatalog {
    candidates: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidateCatalog {
    /// Builds a catalog, rejecting duplicate ids and out-of-range fields.
    pub fn new(candidates: Vec<Candidate>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(candidates.len());
        for (pos, candidate) in candidates.iter().enumerate() {
            candidate.check()?;
            if index.insert(candidate.candidate_id.clone(), pos).is_some() {
                return Err(ModelError::DuplicateCandidate {
                    candidate_id: candidate.candidate_id.clone(),
                });
            }
        }
        Ok(Self { candidates, index })
    }

    pub fn get(&self, candidate_id: &str) -> Option<&Candidate> {
        self.index.get(candidate_id).map(|&pos| &self.candidates[pos])
    }

    pub fn contains(&self, candidate_id: &str) -> bool {
        self.index.contains_key(candidate_id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

impl TryFrom<Vec<Candidate>> for CandidateCatalog {
    type Error = ModelError;

    fn try_from(candidates: Vec<Candidate>) -> Result<Self, Self::Error> {
        Self::new(candidates)
    }
}

impl From<CandidateCatalog> for Vec<Candidate> {
    fn from(catalog: CandidateCatalog) -> Self {
        catalog.candidates
    }
}
