use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Entity, EntitySource};

use super::error::EntityError;

pub const PATTERN_CONFIDENCE: f64 = 0.95;
pub const GAZETTEER_CONFIDENCE: f64 = 0.85;

/// A recognizer over the canonical text. Offsets are characters.
pub trait EntityRecognizer: Send + Sync {
    fn source(&self) -> EntitySource;

    fn recognize(&self, text: &str) -> Vec<Entity>;
}

/// One regex rule of the pattern lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub label: String,
    pub pattern: String,
}

impl PatternRule {
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

/// Identifiers common in Italian customer email.
pub fn default_pattern_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            "EMAIL",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
        ),
        PatternRule::new(
            "CODICEFISCALE",
            r"\b[A-Z]{6}\d{2}[A-Z]\d{2}[A-Z]\d{3}[A-Z]\b",
        ),
        PatternRule::new("PARTITAIVA", r"\b(IT)?\d{11}\b"),
        PatternRule::new(
            "IBAN",
            r"\b[A-Z]{2}\d{2}\s?[A-Z0-9]{4}\s?\d{4}\s?\d{4}\s?\d{4}\s?\d{4}\s?\d{3}\b",
        ),
        PatternRule::new("TELEFONO", r"\b\+?\d{2,4}[\s.-]?\d{6,10}\b"),
    ]
}

/// Byte offset to character offset lookup for one text.
struct CharIndex {
    boundaries: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// `byte` must lie on a char boundary, which regex match offsets always do.
    fn char_offset(&self, byte: usize) -> usize {
        self.boundaries
            .binary_search(&byte)
            .unwrap_or_else(|insert| insert)
    }
}

/// Case-insensitive regex lexicon recognizer.
#[derive(Debug, Clone)]
pub struct PatternRecognizer {
    rules: Vec<(String, Regex)>,
}

impl PatternRecognizer {
    pub fn new(rules: &[PatternRule]) -> Result<Self, EntityError> {
        let rules = rules
            .iter()
            .map(|rule| {
                RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (rule.label.clone(), re))
                    .map_err(|source| EntityError::InvalidPattern {
                        label: rule.label.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn with_default_rules() -> Result<Self, EntityError> {
        Self::new(&default_pattern_rules())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn source(&self) -> EntitySource {
        EntitySource::Pattern
    }

    fn recognize(&self, text: &str) -> Vec<Entity> {
        let index = CharIndex::new(text);
        let mut entities = Vec::new();

        for (label, re) in &self.rules {
            for m in re.find_iter(text) {
                entities.push(Entity::new(
                    m.as_str(),
                    label.as_str(),
                    index.char_offset(m.start()),
                    index.char_offset(m.end()),
                    EntitySource::Pattern,
                    PATTERN_CONFIDENCE,
                ));
            }
        }

        debug!(entities = entities.len(), "Pattern recognizer finished");
        entities
    }
}

/// A known entity and the surface forms it appears under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazetteerEntry {
    pub lemma: String,
    #[serde(default, alias = "surface_forms")]
    pub surface_forms: Vec<String>,
}

impl GazetteerEntry {
    /// Surface forms to search; the lemma itself when none are listed.
    fn forms(&self) -> Vec<&str> {
        if self.surface_forms.is_empty() {
            vec![self.lemma.as_str()]
        } else {
            self.surface_forms.iter().map(String::as_str).collect()
        }
    }
}

/// Whole-word, case-insensitive gazetteer lookup. Entities are labeled with the entry lemma.
///
/// The lexicon is grouped by entity type, e.g. `{"AZIENDA": [{"lemma": "ACME", ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GazetteerRecognizer {
    lexicon: BTreeMap<String, Vec<GazetteerEntry>>,
}

impl GazetteerRecognizer {
    pub fn new(lexicon: BTreeMap<String, Vec<GazetteerEntry>>) -> Result<Self, EntityError> {
        for entry in lexicon.values().flatten() {
            if entry.forms().iter().any(|f| f.trim().is_empty()) {
                return Err(EntityError::InvalidGazetteerEntry {
                    lemma: entry.lemma.clone(),
                    reason: "empty surface form".to_string(),
                });
            }
        }
        Ok(Self { lexicon })
    }

    pub fn len(&self) -> usize {
        self.lexicon.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn same_ignoring_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

impl EntityRecognizer for GazetteerRecognizer {
    fn source(&self) -> EntitySource {
        EntitySource::Gazetteer
    }

    fn recognize(&self, text: &str) -> Vec<Entity> {
        let chars: Vec<char> = text.chars().collect();
        let mut entities = Vec::new();

        for entry in self.lexicon.values().flatten() {
            for form in entry.forms() {
                let needle: Vec<char> = form.chars().collect();
                if needle.is_empty() || needle.len() > chars.len() {
                    continue;
                }

                for start in 0..=chars.len() - needle.len() {
                    let end = start + needle.len();
                    let matched = chars[start..end]
                        .iter()
                        .zip(&needle)
                        .all(|(&a, &b)| same_ignoring_case(a, b));
                    if !matched {
                        continue;
                    }

                    let before_ok = start == 0 || !chars[start - 1].is_alphanumeric();
                    let after_ok = end == chars.len() || !chars[end].is_alphanumeric();
                    if before_ok && after_ok {
                        entities.push(Entity::new(
                            chars[start..end].iter().collect::<String>(),
                            entry.lemma.as_str(),
                            start,
                            end,
                            EntitySource::Gazetteer,
                            GAZETTEER_CONFIDENCE,
                        ));
                    }
                }
            }
        }

        debug!(entities = entities.len(), "Gazetteer recognizer finished");
        entities
    }
}
