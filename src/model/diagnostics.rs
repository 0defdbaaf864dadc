use serde::{Deserialize, Serialize};

/// Error taxonomy shared by rejections and stage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    MalformedOutput,
    SchemaViolation,
    InvalidLabel,
    InventedReference,
    EvidenceNotVerifiable,
    UnknownCandidate,
    CollisionIndexUnavailable,
    ClassifierUnavailable,
    Cancelled,
}

impl ErrorCode {
    /// Rejections with these codes may be retried by re-invoking the classifier.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::MalformedOutput
                | ErrorCode::SchemaViolation
                | ErrorCode::InvalidLabel
                | ErrorCode::InventedReference
                | ErrorCode::EvidenceNotVerifiable
                | ErrorCode::ClassifierUnavailable
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One concrete problem: the offending field path and what was wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Verdict of one validation attempt that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub code: ErrorCode,
    pub attempt: u32,
    pub violations: Vec<Violation>,
    /// Classifier output as received, when the attempt produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl Rejection {
    pub fn new(code: ErrorCode, violations: Vec<Violation>) -> Self {
        Self {
            code,
            attempt: 0,
            violations,
            raw_output: None,
        }
    }

    pub fn single(code: ErrorCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, vec![Violation::new(field, message)])
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn with_raw_output(mut self, raw_output: impl Into<String>) -> Self {
        self.raw_output = Some(raw_output.into());
        self
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} violation(s))", self.code, self.violations.len())?;
        if let Some(first) = self.violations.first() {
            write!(f, ": {}", first)?;
        }
        Ok(())
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    LabelAliasResolved,
    RedundantField,
    UnexpectedField,
    DictionaryVersionMismatch,
    EvidenceFuzzyMatch,
    EvidenceNotVerifiable,
    SpanMismatch,
    SpanOutOfBounds,
    LowConfidence,
    NoKeywords,
    NoEvidence,
    DuplicateTopic,
    DuplicateKeyword,
    CollisionIndexUnavailable,
    ClassifierRetry,
}

/// Non-fatal finding carried into the record's diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub field: String,
    pub message: String,
}

impl Warning {
    pub fn new(code: WarningCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Diagnostics block of the assembled record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
    pub rejections: Vec<Rejection>,
    pub retry_count: u32,
    pub evidence_policy_passed: bool,
}

impl Diagnostics {
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
