use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustomerError {
    #[error("CRM lookup failed: {reason}")]
    LookupFailed { reason: String },

    #[error("CRM lookup timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}
