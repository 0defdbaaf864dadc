//! Structural parse and schema conformance of raw classifier output.
//!
//! Wire contract (keys as sent to the classifier):
//!
//! ```text
//! { "dictionaryversion": int,
//!   "sentiment": { "value": positive|neutral|negative, "confidence": number },
//!   "priority":  { "value": low|medium|high|urgent, "confidence": number, "signals": [string; ≤6] },
//!   "topics": [ { "labelid": string, "confidence": number,
//!                 "keywordsintext": [ { "candidateid": string } ; ≤15 ],
//!                 "evidence": [ { "quote": string(≤200), "span"?: [int, int] } ; ≤3 ] } ; 1..=5 ] }
//! ```

use serde_json::{Map, Value};

use crate::constants::{
    MAX_EVIDENCE_PER_TOPIC, MAX_KEYWORDS_PER_TOPIC, MAX_PRIORITY_SIGNALS, MAX_QUOTE_CHARS,
    MAX_TOPICS, canonical_label, clamp_unit,
};
use crate::evidence::RawEvidence;
use crate::model::{
    ClassifierPriority, ErrorCode, PriorityLevel, Rejection, Sentiment, SentimentValue, Span,
    Violation, Warning, WarningCode,
};

use super::types::{ECHO_FIELDS, RawClassifierOutput, RawKeywordReference, RawTopic};

const TOP_LEVEL_KEYS: &[&str] = &["dictionaryversion", "sentiment", "priority", "topics"];
const TOPIC_KEYS: &[&str] = &["labelid", "confidence", "keywordsintext", "evidence"];
const EVIDENCE_KEYS: &[&str] = &["quote", "span"];
const SENTIMENT_KEYS: &[&str] = &["value", "confidence"];
const PRIORITY_KEYS: &[&str] = &["value", "confidence", "signals"];

/// Stage 1: JSON syntax and a top-level object.
pub fn parse(input: &str) -> Result<Value, Rejection> {
    let value: Value = serde_json::from_str(input).map_err(|e| {
        Rejection::single(ErrorCode::MalformedOutput, "$", format!("invalid JSON: {}", e))
    })?;

    if !value.is_object() {
        return Err(Rejection::single(
            ErrorCode::MalformedOutput,
            "$",
            format!("expected a JSON object, got {}", kind(&value)),
        ));
    }

    Ok(value)
}

/// Remaps known label variants to canonical ids, in place.
pub fn normalize_label_aliases(value: &mut Value, warnings: &mut Vec<Warning>) {
    let Some(topics) = value.get_mut("topics").and_then(Value::as_array_mut) else {
        return;
    };

    for (idx, topic) in topics.iter_mut().enumerate() {
        let Some(label) = topic.get_mut("labelid") else {
            continue;
        };
        let Some(alias) = label.as_str() else {
            continue;
        };
        let Some(canonical) = canonical_label(alias) else {
            continue;
        };
        warnings.push(Warning::new(
            WarningCode::LabelAliasResolved,
            format!("topics[{}].labelid", idx),
            format!("label alias '{}' resolved to '{}'", alias, canonical),
        ));
        *label = Value::String(canonical.to_string());
    }
}

/// Stage 2: shape, types and bounds. Collects every violation before rejecting.
pub fn conform(value: &Value, warnings: &mut Vec<Warning>) -> Result<RawClassifierOutput, Rejection> {
    let mut schema = Schema::default();

    let parsed = schema.object(value, "$").and_then(|root| {
        schema.no_extra(root, TOP_LEVEL_KEYS, "$");

        let dictionary_version = schema
            .required(root, "dictionaryversion", "$")
            .and_then(|v| schema.u32(v, "dictionaryversion"));
        let sentiment = schema
            .required(root, "sentiment", "$")
            .and_then(|v| schema.sentiment(v));
        let priority = schema
            .required(root, "priority", "$")
            .and_then(|v| schema.priority(v));
        let topics = schema
            .required(root, "topics", "$")
            .and_then(|v| schema.topics(v, warnings));

        match (dictionary_version, sentiment, priority, topics) {
            (Some(dictionary_version), Some(sentiment), Some(priority), Some(topics)) => {
                Some(RawClassifierOutput {
                    dictionary_version,
                    sentiment,
                    priority,
                    topics,
                })
            }
            _ => None,
        }
    });

    match parsed {
        Some(output) if schema.violations.is_empty() => Ok(output),
        _ => Err(Rejection::new(ErrorCode::SchemaViolation, schema.violations)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn child(parent: &str, key: &str) -> String {
    if parent == "$" {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

#[derive(Debug, Default)]
struct Schema {
    violations: Vec<Violation>,
}

impl Schema {
    fn fail(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }

    fn object<'v>(&mut self, value: &'v Value, field: &str) -> Option<&'v Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.fail(field, format!("expected object, got {}", kind(value)));
        }
        obj
    }

    fn required<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<&'v Value> {
        let value = obj.get(key);
        if value.is_none() {
            self.fail(child(parent, key), "required field missing");
        }
        value
    }

    fn no_extra(&mut self, obj: &Map<String, Value>, allowed: &[&str], field: &str) {
        for key in obj.keys() {
            if !allowed.contains(&key.as_str()) {
                self.fail(child(field, key), "additional property not allowed");
            }
        }
    }

    fn string(&mut self, value: &Value, field: &str) -> Option<String> {
        let s = value.as_str().map(str::to_string);
        if s.is_none() {
            self.fail(field, format!("expected string, got {}", kind(value)));
        }
        s
    }

    fn number(&mut self, value: &Value, field: &str) -> Option<f64> {
        match value.as_f64() {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.fail(field, format!("expected number, got {}", kind(value)));
                None
            }
        }
    }

    fn u32(&mut self, value: &Value, field: &str) -> Option<u32> {
        let n = value.as_u64().and_then(|n| u32::try_from(n).ok());
        if n.is_none() {
            self.fail(field, "expected non-negative integer");
        }
        n
    }

    fn array<'v>(
        &mut self,
        value: &'v Value,
        field: &str,
        min: usize,
        max: usize,
    ) -> Option<&'v Vec<Value>> {
        let Some(items) = value.as_array() else {
            self.fail(field, format!("expected array, got {}", kind(value)));
            return None;
        };
        if items.len() < min || items.len() > max {
            self.fail(
                field,
                format!("expected {}..={} items, got {}", min, max, items.len()),
            );
            return None;
        }
        Some(items)
    }

    fn sentiment(&mut self, value: &Value) -> Option<Sentiment> {
        let field = "sentiment";
        let obj = self.object(value, field)?;
        self.no_extra(obj, SENTIMENT_KEYS, field);

        let sentiment_value = self
            .required(obj, "value", field)
            .and_then(|v| self.string(v, "sentiment.value"))
            .and_then(|s| match s.parse::<SentimentValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    self.fail("sentiment.value", e);
                    None
                }
            });
        let confidence = self
            .required(obj, "confidence", field)
            .and_then(|v| self.number(v, "sentiment.confidence"));

        Some(Sentiment {
            value: sentiment_value?,
            confidence: clamp_unit(confidence?),
        })
    }

    fn priority(&mut self, value: &Value) -> Option<ClassifierPriority> {
        let field = "priority";
        let obj = self.object(value, field)?;
        self.no_extra(obj, PRIORITY_KEYS, field);

        let level = self
            .required(obj, "value", field)
            .and_then(|v| self.string(v, "priority.value"))
            .and_then(|s| match s.parse::<PriorityLevel>() {
                Ok(v) => Some(v),
                Err(e) => {
                    self.fail("priority.value", e);
                    None
                }
            });
        let confidence = self
            .required(obj, "confidence", field)
            .and_then(|v| self.number(v, "priority.confidence"));
        let signals = self
            .required(obj, "signals", field)
            .and_then(|v| self.array(v, "priority.signals", 0, MAX_PRIORITY_SIGNALS))
            .and_then(|items| {
                let parsed: Vec<Option<String>> = items
                    .iter()
                    .enumerate()
                    .map(|(i, s)| self.string(s, &format!("priority.signals[{}]", i)))
                    .collect();
                parsed.into_iter().collect::<Option<Vec<_>>>()
            });

        Some(ClassifierPriority {
            value: level?,
            confidence: clamp_unit(confidence?),
            signals: signals?,
        })
    }

    fn topics(&mut self, value: &Value, warnings: &mut Vec<Warning>) -> Option<Vec<RawTopic>> {
        let items = self.array(value, "topics", 1, MAX_TOPICS)?;
        let parsed: Vec<Option<RawTopic>> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| self.topic(item, idx, warnings))
            .collect();
        parsed.into_iter().collect()
    }

    fn topic(&mut self, value: &Value, idx: usize, warnings: &mut Vec<Warning>) -> Option<RawTopic> {
        let field = format!("topics[{}]", idx);
        let obj = self.object(value, &field)?;
        self.no_extra(obj, TOPIC_KEYS, &field);

        let label_id = self
            .required(obj, "labelid", &field)
            .and_then(|v| self.string(v, &child(&field, "labelid")))
            .and_then(|label| {
                if label.trim().is_empty() {
                    self.fail(child(&field, "labelid"), "empty label id");
                    None
                } else {
                    Some(label)
                }
            });
        let confidence = self
            .required(obj, "confidence", &field)
            .and_then(|v| self.number(v, &child(&field, "confidence")));

        let keywords_field = child(&field, "keywordsintext");
        let keywords = self
            .required(obj, "keywordsintext", &field)
            .and_then(|v| self.array(v, &keywords_field, 0, MAX_KEYWORDS_PER_TOPIC))
            .and_then(|items| {
                let parsed: Vec<Option<RawKeywordReference>> = items
                    .iter()
                    .enumerate()
                    .map(|(k, item)| {
                        self.keyword(item, &format!("{}[{}]", keywords_field, k), warnings)
                    })
                    .collect();
                parsed.into_iter().collect::<Option<Vec<_>>>()
            });

        let evidence_field = child(&field, "evidence");
        let evidence = self
            .required(obj, "evidence", &field)
            .and_then(|v| self.array(v, &evidence_field, 0, MAX_EVIDENCE_PER_TOPIC))
            .and_then(|items| {
                let parsed: Vec<Option<RawEvidence>> = items
                    .iter()
                    .enumerate()
                    .map(|(e, item)| self.evidence(item, &format!("{}[{}]", evidence_field, e)))
                    .collect();
                parsed.into_iter().collect::<Option<Vec<_>>>()
            });

        Some(RawTopic {
            label_id: label_id?,
            confidence: clamp_unit(confidence?),
            keywords: keywords?,
            evidence: evidence?,
        })
    }

    fn keyword(
        &mut self,
        value: &Value,
        field: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<RawKeywordReference> {
        let obj = self.object(value, field)?;
        let candidate_id = self
            .required(obj, "candidateid", field)
            .and_then(|v| self.string(v, &child(field, "candidateid")))?;

        let mut echoed_fields = Vec::new();
        for key in obj.keys().filter(|k| k.as_str() != "candidateid") {
            if ECHO_FIELDS.contains(&key.as_str()) {
                echoed_fields.push(key.clone());
            } else {
                warnings.push(Warning::new(
                    WarningCode::UnexpectedField,
                    child(field, key),
                    format!(
                        "unexpected field '{}' stripped from candidate '{}'",
                        key, candidate_id
                    ),
                ));
            }
        }

        Some(RawKeywordReference {
            candidate_id,
            echoed_fields,
        })
    }

    fn evidence(&mut self, value: &Value, field: &str) -> Option<RawEvidence> {
        let obj = self.object(value, field)?;
        self.no_extra(obj, EVIDENCE_KEYS, field);

        let quote = self
            .required(obj, "quote", field)
            .and_then(|v| self.string(v, &child(field, "quote")))
            .and_then(|quote| {
                let len = quote.chars().count();
                if len > MAX_QUOTE_CHARS {
                    self.fail(
                        child(field, "quote"),
                        format!("quote has {} characters, max {}", len, MAX_QUOTE_CHARS),
                    );
                    None
                } else {
                    Some(quote)
                }
            });

        let span = match obj.get("span") {
            None | Some(Value::Null) => Some(None),
            Some(v) => self.span(v, &child(field, "span")).map(Some),
        };

        Some(RawEvidence {
            quote: quote?,
            span: span?,
        })
    }

    fn span(&mut self, value: &Value, field: &str) -> Option<Span> {
        let items = self.array(value, field, 2, 2)?;
        let start = self.u32(&items[0], &format!("{}[0]", field))?;
        let end = self.u32(&items[1], &format!("{}[1]", field))?;
        if start >= end {
            self.fail(field, format!("span start {} must be < end {}", start, end));
            return None;
        }
        Some(Span::new(start as usize, end as usize))
    }
}
