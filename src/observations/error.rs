use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObservationError {
    /// A resolved keyword no longer matches the run's catalog snapshot.
    #[error("candidate '{candidate_id}' under label '{label_id}' is absent from the catalog")]
    UnknownCandidate {
        label_id: String,
        candidate_id: String,
    },
}
