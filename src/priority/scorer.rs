use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::model::{CustomerValue, PriorityAssessment, PriorityLevel, SentimentValue};

use super::error::PriorityError;

pub const URGENT_TERMS: &[&str] = &[
    "urgente",
    "bloccante",
    "diffida",
    "reclamo",
    "rimborso",
    "disdetta",
    "guasto",
    "fermo",
    "critico",
    "sla",
];

pub const HIGH_TERMS: &[&str] = &[
    "problema",
    "errore",
    "non funziona",
    "assistenza",
    "supporto",
];

pub const DEADLINE_PATTERNS: &[&str] = &[
    r"entro il \d{1,2}",
    r"scadenza.*\d{4}-\d{2}-\d{2}",
    r"entro \d{1,2} giorni",
];

/// Multiplier applied to `deadline` when any deadline pattern matches.
const DEADLINE_BOOST: f64 = 2.0;

/// Score thresholds and bucket confidences, highest first.
const BUCKETS: &[(f64, PriorityLevel, f64)] = &[
    (7.0, PriorityLevel::Urgent, 0.95),
    (4.0, PriorityLevel::High, 0.85),
    (2.0, PriorityLevel::Medium, 0.75),
];
const LOW_CONFIDENCE: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityWeights {
    /// Per distinct urgent term present.
    pub urgent_term: f64,
    /// Per distinct high term present.
    pub high_term: f64,
    pub negative_sentiment: f64,
    pub new_customer: f64,
    pub deadline: f64,
    pub vip: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            urgent_term: 3.0,
            high_term: 1.5,
            negative_sentiment: 2.0,
            new_customer: 1.0,
            deadline: 2.0,
            vip: 2.5,
        }
    }
}

/// Inputs of one scoring call.
#[derive(Debug, Clone, Copy)]
pub struct PrioritySignals<'a> {
    pub subject: &'a str,
    pub body: &'a str,
    pub sentiment: SentimentValue,
    pub customer: CustomerValue,
    pub vip: bool,
}

#[derive(Debug, Clone)]
pub struct PriorityScorer {
    weights: PriorityWeights,
    deadlines: Vec<Regex>,
}

impl PriorityScorer {
    pub fn new() -> Result<Self, PriorityError> {
        Self::with_weights(PriorityWeights::default())
    }

    pub fn with_weights(weights: PriorityWeights) -> Result<Self, PriorityError> {
        let deadlines = DEADLINE_PATTERNS
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| PriorityError::InvalidDeadlinePattern {
                        pattern: p.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { weights, deadlines })
    }

    pub fn weights(&self) -> &PriorityWeights {
        &self.weights
    }

    /// Scores the lowercased `subject + " " + body`. Each term counts once however often it
    /// occurs; terms are matched as substrings.
    pub fn score(&self, input: &PrioritySignals<'_>) -> PriorityAssessment {
        let text = format!("{} {}", input.subject, input.body).to_lowercase();
        let w = &self.weights;
        let mut raw_score = 0.0;
        let mut signals = Vec::new();

        let urgent = URGENT_TERMS.iter().filter(|t| text.contains(*t)).count();
        if urgent > 0 {
            raw_score += w.urgent_term * urgent as f64;
            signals.push(format!("urgent_keywords:{}", urgent));
        }

        let high = HIGH_TERMS.iter().filter(|t| text.contains(*t)).count();
        if high > 0 {
            raw_score += w.high_term * high as f64;
            signals.push(format!("high_keywords:{}", high));
        }

        if input.sentiment == SentimentValue::Negative {
            raw_score += w.negative_sentiment;
            signals.push("negative_sentiment".to_string());
        }

        if input.customer == CustomerValue::New {
            raw_score += w.new_customer;
            signals.push("new_customer".to_string());
        }

        if self.deadlines.iter().any(|re| re.is_match(&text)) {
            raw_score += w.deadline * DEADLINE_BOOST;
            signals.push("deadline_mentioned".to_string());
        }

        if input.vip {
            raw_score += w.vip;
            signals.push("vip_customer".to_string());
        }

        let (value, confidence) = BUCKETS
            .iter()
            .find(|(threshold, _, _)| raw_score >= *threshold)
            .map(|&(_, level, conf)| (level, conf))
            .unwrap_or((PriorityLevel::Low, LOW_CONFIDENCE));

        debug!(
            raw_score = raw_score,
            priority = ?value,
            signals = signals.len(),
            "Priority scored"
        );

        PriorityAssessment {
            value,
            confidence,
            signals,
            raw_score,
        }
    }
}
