use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::constants::QUOTE_PREVIEW_CHARS;
use crate::hashing::hash_canonical_text;
use crate::metrics::PipelineMetrics;
use crate::model::{EvidenceItem, Span, Verification, Warning, WarningCode};

use super::similarity::{LcsBound, Matcher};
use super::types::{EvidenceConfig, EvidenceVerification, RawEvidence};

/// First `QUOTE_PREVIEW_CHARS` characters of a quote, for logs and warnings.
pub(crate) fn preview(quote: &str) -> String {
    let mut out: String = quote.chars().take(QUOTE_PREVIEW_CHARS).collect();
    if quote.chars().count() > QUOTE_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

/// Checks evidence quotes against the canonical text. Annotates every item, drops none.
#[derive(Debug, Clone, Default)]
pub struct EvidenceVerifier {
    config: EvidenceConfig,
    metrics: Option<PipelineMetrics>,
}

impl EvidenceVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvidenceConfig) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Counts every verification outcome in `triage_span_status_total`.
    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    pub fn verify(&self, evidence: &[RawEvidence], canonical_text: &str) -> EvidenceVerification {
        let text: Vec<char> = canonical_text.chars().collect();
        let text_hash = hash_canonical_text(canonical_text);
        let mut matcher = Matcher::new();
        let mut out = EvidenceVerification::default();

        for (idx, raw) in evidence.iter().enumerate() {
            let field = format!("evidence[{}]", idx);
            let (verification, span_computed, similarity) =
                self.locate(&mut matcher, &raw.quote, canonical_text, &text);
            if let Some(metrics) = &self.metrics {
                metrics.record_span_status(verification);
            }

            match verification {
                Verification::Exact => {
                    debug!(quote = %preview(&raw.quote), "Evidence matched exactly");
                }
                Verification::Fuzzy => {
                    debug!(
                        quote = %preview(&raw.quote),
                        similarity = similarity,
                        "Evidence matched fuzzily"
                    );
                    out.warnings.push(Warning::new(
                        WarningCode::EvidenceFuzzyMatch,
                        format!("{}.quote", field),
                        format!(
                            "quote '{}' matched approximately (similarity {:.3})",
                            preview(&raw.quote),
                            similarity
                        ),
                    ));
                }
                Verification::NotFound => {
                    warn!(quote = %preview(&raw.quote), "Evidence quote not found in text");
                    out.warnings.push(Warning::new(
                        WarningCode::EvidenceNotVerifiable,
                        format!("{}.quote", field),
                        format!("quote '{}' not found in text", preview(&raw.quote)),
                    ));
                }
            }

            if let Some(span) = raw.span {
                if let Some(warning) = check_supplied_span(&field, span, &raw.quote, &text) {
                    out.warnings.push(warning);
                }
            }

            out.items.push(EvidenceItem {
                quote: raw.quote.clone(),
                span_original: raw.span,
                span_computed,
                verification,
                similarity,
                text_hash: text_hash.clone(),
            });
        }

        out
    }

    fn locate(
        &self,
        matcher: &mut Matcher,
        quote: &str,
        canonical_text: &str,
        text: &[char],
    ) -> (Verification, Option<Span>, f64) {
        if quote.is_empty() || text.is_empty() {
            return (Verification::NotFound, None, 0.0);
        }

        if let Some(byte_start) = canonical_text.find(quote) {
            let start = canonical_text[..byte_start].chars().count();
            let end = start + quote.chars().count();
            return (Verification::Exact, Some(Span::new(start, end)), 1.0);
        }

        match self.fuzzy_search(matcher, quote, text) {
            Some((span, similarity)) if similarity >= self.config.fuzzy_threshold => {
                (Verification::Fuzzy, Some(span), similarity)
            }
            Some((_, similarity)) => (Verification::NotFound, None, similarity),
            None => (Verification::NotFound, None, 0.0),
        }
    }

    /// Best window over the whole text. Windows are `len(quote) + margin` characters (shorter
    /// at the end of the text); ties keep the leftmost window.
    ///
    /// A window is aligned only if its [`LcsBound`] ceiling reaches the fuzzy threshold and
    /// beats the best score so far. The accepted match is the same as aligning every window;
    /// a `not_found` similarity only reflects windows that came within reach of the threshold.
    fn fuzzy_search(
        &self,
        matcher: &mut Matcher,
        quote: &str,
        text: &[char],
    ) -> Option<(Span, f64)> {
        let quote: Vec<char> = quote.chars().collect();
        let quote_chars: HashSet<char> = quote.iter().copied().collect();
        let window_len = quote.len() + self.config.fuzzy_margin;
        let mut bound = LcsBound::new(&quote);

        let mut best: Option<(Span, f64)> = None;
        let mut aligned = 0usize;

        for start in 0..text.len() {
            // A window opening on a character absent from the quote is covered by the next one.
            if !quote_chars.contains(&text[start]) {
                continue;
            }

            let end = (start + window_len).min(text.len());
            let window = &text[start..end];

            let ceiling = bound.ceiling(window);
            if ceiling < self.config.fuzzy_threshold
                || best.as_ref().is_some_and(|(_, score)| ceiling <= *score)
            {
                continue;
            }

            aligned += 1;
            let Some(found) = matcher.align(&quote, window) else {
                continue;
            };

            let better = best
                .as_ref()
                .is_none_or(|(_, score)| found.similarity > *score);
            if better {
                let span = Span::new(start + found.region_start, start + found.region_end);
                best = Some((span, found.similarity));
                if found.similarity >= 1.0 {
                    break;
                }
            }
        }

        trace!(windows = text.len(), aligned, "Fuzzy search finished");
        best
    }
}

fn check_supplied_span(field: &str, span: Span, quote: &str, text: &[char]) -> Option<Warning> {
    if span.start >= span.end || span.end > text.len() {
        return Some(Warning::new(
            WarningCode::SpanOutOfBounds,
            format!("{}.span", field),
            format!(
                "span [{}, {}) out of bounds for text length {}",
                span.start,
                span.end,
                text.len()
            ),
        ));
    }

    let extracted: String = text[span.start..span.end].iter().collect();
    if extracted != quote {
        return Some(Warning::new(
            WarningCode::SpanMismatch,
            format!("{}.span", field),
            format!(
                "span [{}, {}) extracts '{}' but quote is '{}'",
                span.start,
                span.end,
                preview(&extracted),
                preview(quote)
            ),
        ));
    }

    None
}
