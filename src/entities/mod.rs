//! Entity recognition and deterministic merging.
//!
//! Three recognizers run independently over the canonical text: pattern (regex), gazetteer
//! and statistical. The statistical one lives outside this crate; its entities are passed
//! in. [`EntityMerger`] reduces the union to a non-overlapping set.

pub mod error;
pub mod merger;
pub mod recognizers;


pub use error::EntityError;
pub use merger::EntityMerger;
pub use recognizers::{
    EntityRecognizer, GazetteerEntry, GazetteerRecognizer, PatternRecognizer, PatternRule,
    default_pattern_rules,
};
