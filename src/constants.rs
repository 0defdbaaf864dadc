//! Cross-cutting, pinned constants.
//!
//! Weights, bounds and thresholds live here so every stage agrees on them. Values that
//! are tunable at runtime (fuzzy threshold, evidence failure rate, retry cap) only provide
//! defaults here; [`crate::config::EnrichConfig`] carries the effective values.
//!
//! # Calibration Weights
//!
//! The four calibration weights sum to `1.0`. Each term is clamped to `[0, 1]` before it
//! is weighted, so the combined value is also in `[0, 1]`.

/// Weight of the classifier's own confidence.
pub const WEIGHT_RAW_CONFIDENCE: f64 = 0.3;
/// Weight of the average composite score of resolved keywords.
pub const WEIGHT_KEYWORD_QUALITY: f64 = 0.4;
/// Weight of evidence coverage (`min(evidence / 2, 1)`).
pub const WEIGHT_EVIDENCE_COVERAGE: f64 = 0.2;
/// Weight of the average collision penalty.
pub const WEIGHT_COLLISION: f64 = 0.1;

/// Evidence items needed for full coverage.
pub const EVIDENCE_SATURATION: f64 = 2.0;

/// Adjusted confidence for a topic with no resolved keywords.
pub const UNGROUNDED_TOPIC_CONFIDENCE: f64 = 0.1;

/// Raw confidence below this produces a quality warning.
pub const MIN_CONFIDENCE_WARNING: f64 = 0.2;

pub const MAX_TOPICS: usize = 5;
pub const MAX_KEYWORDS_PER_TOPIC: usize = 15;
pub const MAX_EVIDENCE_PER_TOPIC: usize = 3;
pub const MAX_QUOTE_CHARS: usize = 200;
pub const MAX_PRIORITY_SIGNALS: usize = 6;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_FUZZY_MARGIN: usize = 20;
pub const DEFAULT_EVIDENCE_FAILURE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 30_000;

/// Characters of a quote kept in log fields and warnings.
pub const QUOTE_PREVIEW_CHARS: usize = 50;

/// Closed topic taxonomy used when no explicit allow-list is configured.
pub const DEFAULT_TOPIC_LABELS: &[&str] = &[
    "FATTURAZIONE",
    "ASSISTENZA_TECNICA",
    "RECLAMO",
    "INFO_COMMERCIALI",
    "DOCUMENTI",
    "APPUNTAMENTO",
    "CONTRATTO",
    "GARANZIA",
    "SPEDIZIONE",
    "UNKNOWN_TOPIC",
];

/// Cosmetic label variants the classifier is known to emit, mapped to canonical ids.
pub const LABEL_ALIASES: &[(&str, &str)] = &[
    ("ASSISTENZA", "ASSISTENZA_TECNICA"),
    ("SUPPORTO_TECNICO", "ASSISTENZA_TECNICA"),
    ("FATTURA", "FATTURAZIONE"),
    ("FATTURE", "FATTURAZIONE"),
    ("INFO_COMMERCIALE", "INFO_COMMERCIALI"),
    ("INFORMAZIONI_COMMERCIALI", "INFO_COMMERCIALI"),
    ("DOCUMENTO", "DOCUMENTI"),
    ("CONTRATTI", "CONTRATTO"),
    ("RECLAMI", "RECLAMO"),
    ("SPEDIZIONI", "SPEDIZIONE"),
    ("APPUNTAMENTI", "APPUNTAMENTO"),
    ("UNKNOWN", "UNKNOWN_TOPIC"),
];

/// Returns the canonical label for a known alias.
pub fn canonical_label(label: &str) -> Option<&'static str> {
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == label)
        .map(|(_, canonical)| *canonical)
}

/// Clamps a value into `[0, 1]`. `NaN` maps to `0.0`.
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
