//! Rule-based priority scoring.
//!
//! The classifier proposes a priority, but the record carries the one computed here from
//! the message text, sentiment and customer status. The classifier's proposal is kept for
//! audit only.

pub mod error;
pub mod scorer;


pub use error::PriorityError;
pub use scorer::{
    DEADLINE_PATTERNS, HIGH_TERMS, PriorityScorer, PrioritySignals, PriorityWeights, URGENT_TERMS,
};
