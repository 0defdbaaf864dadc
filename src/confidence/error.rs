use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfidenceError {
    #[error("collision index unavailable: {reason}")]
    CollisionIndexUnavailable { reason: String },
}
