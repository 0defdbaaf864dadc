use tracing::warn;

use crate::constants::DEFAULT_EVIDENCE_FAILURE_THRESHOLD;
use crate::model::{EvidenceItem, Verification};

/// Blocking rule for unverifiable evidence.
///
/// Individual `not_found` items are warnings. Once their share of all evidence in a message
/// exceeds `max_failure_rate`, the message is rejected with `EvidenceNotVerifiable`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvidencePolicy {
    pub max_failure_rate: f64,
}

impl Default for EvidencePolicy {
    fn default() -> Self {
        Self {
            max_failure_rate: DEFAULT_EVIDENCE_FAILURE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyOutcome {
    pub total: usize,
    pub not_found: usize,
    pub failure_rate: f64,
    pub passed: bool,
}

impl EvidencePolicy {
    pub fn new(max_failure_rate: f64) -> Self {
        Self { max_failure_rate }
    }

    /// No evidence at all passes; the missing evidence is a quality warning elsewhere.
    pub fn evaluate<'a>(&self, items: impl IntoIterator<Item = &'a EvidenceItem>) -> PolicyOutcome {
        let (total, not_found) = items.into_iter().fold((0usize, 0usize), |(t, n), item| {
            let missed = usize::from(item.verification == Verification::NotFound);
            (t + 1, n + missed)
        });

        if total == 0 {
            return PolicyOutcome {
                total,
                not_found,
                failure_rate: 0.0,
                passed: true,
            };
        }

        let failure_rate = not_found as f64 / total as f64;
        let passed = failure_rate <= self.max_failure_rate;
        if !passed {
            warn!(
                failure_rate = failure_rate,
                threshold = self.max_failure_rate,
                not_found = not_found,
                total = total,
                "Evidence policy failed"
            );
        }

        PolicyOutcome {
            total,
            not_found,
            failure_rate,
            passed,
        }
    }
}
