use thiserror::Error;

/// Errors raised while building trusted snapshots from upstream data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Two catalog entries share an id.
    #[error("duplicate candidate id '{candidate_id}' in catalog")]
    DuplicateCandidate { candidate_id: String },

    /// A catalog entry violates a field invariant.
    #[error("invalid candidate '{candidate_id}': {reason}")]
    InvalidCandidate {
        candidate_id: String,
        reason: String,
    },
}
