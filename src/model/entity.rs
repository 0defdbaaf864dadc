use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Which recognizer produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitySource {
    Pattern,
    Gazetteer,
    Statistical,
}

impl EntitySource {
    /// Merge priority; lower wins.
    #[inline]
    pub fn priority(&self) -> u8 {
        match self {
            EntitySource::Pattern => 0,
            EntitySource::Gazetteer => 1,
            EntitySource::Statistical => 2,
        }
    }
}

/// A recognized entity over the canonical text. Offsets are characters, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub source: EntitySource,
    pub confidence: f64,
}

impl Entity {
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        start: usize,
        end: usize,
        source: EntitySource,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            start,
            end,
            source,
            confidence: crate::constants::clamp_unit(confidence),
        }
    }

    #[inline]
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn overlaps(&self, other: &Entity) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Total order used by the merge sweep: start asc, end desc, source priority asc,
    /// confidence desc, then label and text so equal keys never depend on input order.
    pub fn merge_order(&self, other: &Entity) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| other.end.cmp(&self.end))
            .then_with(|| self.source.priority().cmp(&other.source.priority()))
            .then_with(|| other.confidence.total_cmp(&self.confidence))
            .then_with(|| self.label.cmp(&other.label))
            .then_with(|| self.text.cmp(&other.text))
    }
}
