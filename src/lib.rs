//! Triage enrichment library crate (used by the replay binary and integration tests).
//!
//! Takes the untrusted output of an email-triage classifier and turns it into an
//! audit-ready record: every keyword traced to the candidate catalog, every quote located
//! in the canonical text, a reproducible calibrated confidence per topic, one
//! non-overlapping entity set and an append-only observation trail.
//!
//! # Public API Surface
//!
//! ## Pipeline
//! - [`Orchestrator`], [`MessageInput`], [`RunContext`] - Per-message state machine
//! - [`Classifier`], [`ReplayClassifier`] - Upstream classification boundary
//! - [`PayloadSink`] - Raw and normalized payload audit store
//! - [`PipelineState`], [`PipelineError`], [`FailureReport`] - Outcomes
//!
//! ## Stages
//! - [`SchemaValidator`] - Parse, schema, business rules, quality warnings, dedup
//! - [`CatalogResolver`] - Keyword trust boundary
//! - [`EvidenceVerifier`] - Quote location and span computation
//! - [`ConfidenceCalibrator`], [`CollisionIndex`] - Calibrated confidence
//! - [`EntityMerger`], [`PatternRecognizer`], [`GazetteerRecognizer`] - Entities
//! - [`ObservationBuilder`] - Audit trail
//! - [`PriorityScorer`], [`compute_customer_status`] - Routing signals
//!
//! ## Observability
//! - [`PipelineMetrics`] - Prometheus counters and stage latency histograms
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod confidence;
pub mod config;
pub mod constants;
pub mod customer;
pub mod entities;
pub mod evidence;
pub mod hashing;
pub mod metrics;
pub mod model;
pub mod observations;
pub mod pipeline;
pub mod priority;
pub mod resolver;
pub mod validation;

pub use confidence::{
    CalibrationWeights, CollisionIndex, CollisionSource, ConfidenceCalibrator, ConfidenceError,
    load_collision_index,
};
pub use config::{ConfigError, EnrichConfig};
pub use customer::{
    CrmMatch, CustomerError, CustomerLookup, NoCustomerLookup, compute_customer_status,
    status_from_lookup,
};
#[cfg(any(test, feature = "mock"))]
pub use customer::MockCustomerLookup;
pub use entities::{
    EntityError, EntityMerger, EntityRecognizer, GazetteerEntry, GazetteerRecognizer,
    PatternRecognizer, PatternRule, default_pattern_rules,
};
pub use evidence::{EvidenceConfig, EvidencePolicy, EvidenceVerifier, RawEvidence};
pub use hashing::{hash_canonical_text, observation_uuid};
pub use metrics::{MetricsError, PipelineMetrics};
pub use model::{
    AssembledRecord, Candidate, CandidateCatalog, Diagnostics, Entity, EntitySource, ErrorCode,
    EvidenceItem, Observation, PipelineVersion, Rejection, ResolvedKeyword, TopicAssignment,
    Verification, Warning, WarningCode,
};
pub use observations::{IdStrategy, ObservationBuilder, ObservationError};
#[cfg(any(test, feature = "mock"))]
pub use pipeline::{MockClassifier, MockPayloadSink};
pub use pipeline::{
    CancellationFlag, Classifier, ClassifierError, ClassifierRequest, FailureReport,
    MessageInput, NoPayloadSink, Orchestrator, PayloadSink, PipelineError, PipelineState,
    RecognizedEntities, ReplayBundle, ReplayClassifier, RunContext, SinkError,
};
pub use priority::{PriorityError, PriorityScorer, PrioritySignals, PriorityWeights};
pub use resolver::{CatalogResolver, ResolveError};
pub use validation::{SchemaValidator, ValidatedOutput, ValidatorConfig};
