//! Validation of raw classifier output.
//!
//! Stages run in order and stop at the first structural failure:
//!
//! 1. parse (`MalformedOutput`)
//! 2. label alias normalization and schema conformance (`SchemaViolation`)
//! 3. business rules: allowed labels (`InvalidLabel`), catalog ids (`InventedReference`)
//! 4. evidence annotation and the failure-rate policy (`EvidenceNotVerifiable`),
//!    catalog resolution (`UnknownCandidate`)
//! 5. quality warnings
//! 6. deduplication of topics and keywords, first occurrence wins

pub mod raw;
pub mod types;
pub mod validator;


pub use types::{
    CheckedOutput, CheckedTopic, ECHO_FIELDS, RawClassifierOutput, RawKeywordReference, RawTopic,
    ValidatedOutput, ValidatorConfig,
};
pub use validator::SchemaValidator;
