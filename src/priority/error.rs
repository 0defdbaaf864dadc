use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriorityError {
    #[error("invalid deadline pattern '{pattern}': {source}")]
    InvalidDeadlinePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
