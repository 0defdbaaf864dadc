use crate::constants::{DEFAULT_FUZZY_MARGIN, DEFAULT_FUZZY_THRESHOLD};
use crate::model::{EvidenceItem, Span, Warning};

/// Evidence as received from the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvidence {
    pub quote: String,
    pub span: Option<Span>,
}

impl RawEvidence {
    pub fn new(quote: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            span: None,
        }
    }

    pub fn with_span(quote: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            quote: quote.into(),
            span: Some(Span::new(start, end)),
        }
    }
}

/// Tunables for the fuzzy search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidenceConfig {
    /// Minimum similarity accepted as a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Characters added to the quote length to size each search window.
    pub fuzzy_margin: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_margin: DEFAULT_FUZZY_MARGIN,
        }
    }
}

/// Annotated evidence plus the warnings raised while annotating it.
///
/// Items are in input order, one per input item. Warning fields are relative
/// (`evidence[j]...`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceVerification {
    pub items: Vec<EvidenceItem>,
    pub warnings: Vec<Warning>,
}
