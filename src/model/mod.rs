//! Domain types shared by every stage.
//!
//! Untrusted input ([`RawKeywordReference`](crate::validation::RawKeywordReference)) and
//! trusted, catalog-backed values ([`ResolvedKeyword`]) are distinct types; nothing turns
//! one into the other except [`CatalogResolver`](crate::resolver::CatalogResolver).

pub mod catalog;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod observation;
pub mod record;
pub mod topic;
pub mod triage;
pub mod version;


pub use catalog::{Candidate, CandidateCatalog, CandidateSource};
pub use diagnostics::{Diagnostics, ErrorCode, Rejection, Violation, Warning, WarningCode};
pub use entity::{Entity, EntitySource};
pub use error::ModelError;
pub use observation::Observation;
pub use record::AssembledRecord;
pub use topic::{EvidenceItem, ResolvedKeyword, Span, TopicAssignment, Verification};
pub use triage::{
    ClassifierPriority, CustomerStatus, CustomerStatusSource, CustomerValue, PriorityAssessment,
    PriorityLevel, Sentiment, SentimentValue,
};
pub use version::{ModelType, PipelineVersion};
