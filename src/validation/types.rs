use crate::evidence::{EvidenceConfig, EvidencePolicy, PolicyOutcome, RawEvidence};
use crate::model::{ClassifierPriority, EvidenceItem, Sentiment, TopicAssignment, Warning};

/// Keyword fields the classifier tends to echo from its prompt. Present ones are ignored and
/// reported as `redundant_field`.
pub const ECHO_FIELDS: &[&str] = &["term", "lemma", "count", "source", "embeddingscore"];

/// Untrusted keyword reference. Only the id is kept; echoed field names are recorded so the
/// resolver can report them, their values are discarded at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeywordReference {
    pub candidate_id: String,
    pub echoed_fields: Vec<String>,
}

impl RawKeywordReference {
    pub fn new(candidate_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            echoed_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTopic {
    pub label_id: String,
    pub confidence: f64,
    pub keywords: Vec<RawKeywordReference>,
    pub evidence: Vec<RawEvidence>,
}

/// Schema-conformant classifier output. Confidences are already clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassifierOutput {
    pub dictionary_version: u32,
    pub sentiment: Sentiment,
    pub priority: ClassifierPriority,
    pub topics: Vec<RawTopic>,
}

/// Topic that passed business rules and has annotated evidence, keywords still unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedTopic {
    pub label_id: String,
    pub confidence_raw: f64,
    pub keywords: Vec<RawKeywordReference>,
    pub evidence: Vec<EvidenceItem>,
}

/// Output of the retryable part of validation (parse, schema, business rules, evidence).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedOutput {
    pub dictionary_version: u32,
    pub sentiment: Sentiment,
    pub priority: ClassifierPriority,
    pub topics: Vec<CheckedTopic>,
    pub warnings: Vec<Warning>,
    pub evidence_outcome: PolicyOutcome,
}

/// Fully normalized verdict: resolved, quality-checked and deduplicated topics.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOutput {
    pub dictionary_version: u32,
    pub sentiment: Sentiment,
    pub classifier_priority: ClassifierPriority,
    pub topics: Vec<TopicAssignment>,
    pub warnings: Vec<Warning>,
    pub evidence_outcome: PolicyOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    pub evidence: EvidenceConfig,
    pub evidence_policy: EvidencePolicy,
    /// Dictionary version of the run; a different value in the raw output is a warning.
    pub expected_dictionary_version: Option<u32>,
}
