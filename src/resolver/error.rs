use thiserror::Error;

use crate::model::{ErrorCode, Rejection};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A keyword reference names an id absent from the run's catalog.
    #[error("unknown candidate '{candidate_id}' at {field} (label '{label_id}')")]
    UnknownCandidate {
        label_id: String,
        candidate_id: String,
        field: String,
    },
}

impl From<ResolveError> for Rejection {
    fn from(err: ResolveError) -> Self {
        let message = err.to_string();
        match err {
            ResolveError::UnknownCandidate { field, .. } => {
                Rejection::single(ErrorCode::UnknownCandidate, field, message)
            }
        }
    }
}
