use serde::{Deserialize, Serialize};

use super::catalog::{Candidate, CandidateSource};

/// Half-open character range `[start, end)` into the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// How an evidence quote was located in the canonical text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Exact,
    Fuzzy,
    NotFound,
}

impl Verification {
    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verification::Exact => "exact",
            Verification::Fuzzy => "fuzzy",
            Verification::NotFound => "not_found",
        }
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, Verification::NotFound)
    }
}

/// Evidence quote annotated by [`EvidenceVerifier`](crate::evidence::EvidenceVerifier).
///
/// `span_computed` is the only span used downstream. `span_original` is the untrusted span
/// kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub quote: String,
    pub span_original: Option<Span>,
    pub span_computed: Option<Span>,
    pub verification: Verification,
    pub similarity: f64,
    /// BLAKE3 hex digest of the canonical text the span refers to.
    pub text_hash: String,
}

/// Keyword reference merged with its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedKeyword {
    pub candidate_id: String,
    pub term: String,
    pub lemma: String,
    pub count: u32,
    pub source: CandidateSource,
    pub embedding_score: f64,
    pub composite_score: f64,
}

impl From<&Candidate> for ResolvedKeyword {
    fn from(candidate: &Candidate) -> Self {
        Self {
            candidate_id: candidate.candidate_id.clone(),
            term: candidate.term.clone(),
            lemma: candidate.lemma.clone(),
            count: candidate.count,
            source: candidate.source,
            embedding_score: candidate.embedding_score,
            composite_score: candidate.composite_score,
        }
    }
}

/// A label applied to a message, fully resolved.
///
/// `confidence_raw` is the classifier's value (clamped). `confidence_adjusted` is
/// authoritative for routing once calibration has run; before that it mirrors the raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAssignment {
    pub label_id: String,
    pub confidence_raw: f64,
    pub confidence_adjusted: f64,
    pub keywords: Vec<ResolvedKeyword>,
    pub evidence: Vec<EvidenceItem>,
}

impl TopicAssignment {
    pub fn has_keywords(&self) -> bool {
        !self.keywords.is_empty()
    }

    pub fn verified_evidence(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.evidence
            .iter()
            .filter(|item| item.verification.is_verified())
    }
}
