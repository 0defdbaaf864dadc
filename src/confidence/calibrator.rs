use tracing::debug;

use crate::constants::{
    EVIDENCE_SATURATION, UNGROUNDED_TOPIC_CONFIDENCE, WEIGHT_COLLISION, WEIGHT_EVIDENCE_COVERAGE,
    WEIGHT_KEYWORD_QUALITY, WEIGHT_RAW_CONFIDENCE, clamp_unit,
};
use crate::model::TopicAssignment;

use super::collision::CollisionIndex;

/// Weights of the four calibration signals. They sum to 1.0 by default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationWeights {
    pub raw_confidence: f64,
    pub keyword_quality: f64,
    pub evidence_coverage: f64,
    pub collision: f64,
}

impl Default for CalibrationWeights {
    fn default() -> Self {
        Self {
            raw_confidence: WEIGHT_RAW_CONFIDENCE,
            keyword_quality: WEIGHT_KEYWORD_QUALITY,
            evidence_coverage: WEIGHT_EVIDENCE_COVERAGE,
            collision: WEIGHT_COLLISION,
        }
    }
}

/// Computes `confidence_adjusted` for resolved topics.
///
/// ```text
/// 0.3·raw + 0.4·avg(compositeScore) + 0.2·min(evidence/2, 1) + 0.1·avg(collisionPenalty)
/// ```
///
/// Every term is clamped to `[0, 1]` before weighting, and so is the sum. A topic without
/// resolved keywords gets a fixed `0.1`.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceCalibrator {
    weights: CalibrationWeights,
}

impl ConfidenceCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: CalibrationWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &CalibrationWeights {
        &self.weights
    }

    pub fn calibrate(&self, topic: &TopicAssignment, index: &CollisionIndex) -> f64 {
        if topic.keywords.is_empty() {
            return UNGROUNDED_TOPIC_CONFIDENCE;
        }

        let n = topic.keywords.len() as f64;
        let raw = clamp_unit(topic.confidence_raw);
        let quality = clamp_unit(
            topic
                .keywords
                .iter()
                .map(|kw| clamp_unit(kw.composite_score))
                .sum::<f64>()
                / n,
        );
        let coverage = clamp_unit(topic.evidence.len() as f64 / EVIDENCE_SATURATION);
        let collision = clamp_unit(
            topic
                .keywords
                .iter()
                .map(|kw| index.penalty(&kw.lemma, &topic.label_id))
                .sum::<f64>()
                / n,
        );

        let w = &self.weights;
        let adjusted = clamp_unit(
            w.raw_confidence * raw
                + w.keyword_quality * quality
                + w.evidence_coverage * coverage
                + w.collision * collision,
        );

        debug!(
            label_id = %topic.label_id,
            raw = raw,
            quality = quality,
            coverage = coverage,
            collision = collision,
            adjusted = adjusted,
            "Calibrated topic confidence"
        );

        adjusted
    }

    /// Sets `confidence_adjusted` on every topic; `confidence_raw` is left untouched.
    pub fn calibrate_all(&self, topics: &mut [TopicAssignment], index: &CollisionIndex) {
        for topic in topics.iter_mut() {
            topic.confidence_adjusted = self.calibrate(topic, index);
        }
    }
}
