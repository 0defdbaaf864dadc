use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("invalid pattern for '{label}': {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid gazetteer entry '{lemma}': {reason}")]
    InvalidGazetteerEntry { lemma: String, reason: String },
}
