use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::constants::MIN_CONFIDENCE_WARNING;
use crate::evidence::verifier::preview;
use crate::evidence::{EvidencePolicy, EvidenceVerifier, RawEvidence};
use crate::metrics::PipelineMetrics;
use crate::model::{
    CandidateCatalog, EvidenceItem, ErrorCode, Rejection, TopicAssignment, Verification,
    Violation, Warning, WarningCode,
};
use crate::resolver::{CatalogResolver, ResolveError};

use super::raw;
use super::types::{
    CheckedOutput, CheckedTopic, RawClassifierOutput, ValidatedOutput, ValidatorConfig,
};

/// Multi-stage validator for raw classifier output.
///
/// [`check`](Self::check) covers everything a fresh classifier attempt can fix (parse, schema,
/// business rules, evidence policy). [`normalize`](Self::normalize) covers catalog
/// resolution, quality warnings and deduplication. [`validate`](Self::validate) runs both.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    config: ValidatorConfig,
    verifier: EvidenceVerifier,
    resolver: CatalogResolver,
    metrics: Option<PipelineMetrics>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            verifier: EvidenceVerifier::with_config(config.evidence),
            config,
            resolver: CatalogResolver::new(),
            metrics: None,
        }
    }

    /// Counts rejections by code and evidence outcomes by status.
    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.verifier = self.verifier.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(
        &self,
        raw_output: &str,
        catalog: &CandidateCatalog,
        canonical_text: &str,
        allowed_labels: &[String],
    ) -> Result<ValidatedOutput, Rejection> {
        let checked = self.check(raw_output, catalog, canonical_text, allowed_labels)?;
        Ok(self.normalize(checked, catalog)?)
    }

    /// Stages 1-4: parse, schema, business rules, evidence annotation and policy.
    pub fn check(
        &self,
        raw_output: &str,
        catalog: &CandidateCatalog,
        canonical_text: &str,
        allowed_labels: &[String],
    ) -> Result<CheckedOutput, Rejection> {
        let verdict = self.run_checks(raw_output, catalog, canonical_text, allowed_labels);
        if let (Err(rejection), Some(metrics)) = (&verdict, &self.metrics) {
            metrics.record_validation_error(rejection.code);
        }
        verdict
    }

    fn run_checks(
        &self,
        raw_output: &str,
        catalog: &CandidateCatalog,
        canonical_text: &str,
        allowed_labels: &[String],
    ) -> Result<CheckedOutput, Rejection> {
        let mut warnings = Vec::new();

        let mut value = raw::parse(raw_output)?;
        raw::normalize_label_aliases(&mut value, &mut warnings);
        let output = raw::conform(&value, &mut warnings)?;

        debug!(
            topics = output.topics.len(),
            dictionary_version = output.dictionary_version,
            "Raw output conforms to schema"
        );

        if let Some(expected) = self.config.expected_dictionary_version {
            if output.dictionary_version != expected {
                warn!(
                    raw = output.dictionary_version,
                    expected = expected,
                    "Dictionary version mismatch"
                );
                warnings.push(Warning::new(
                    WarningCode::DictionaryVersionMismatch,
                    "dictionaryversion",
                    format!(
                        "classifier reported dictionary version {}, run uses {}",
                        output.dictionary_version, expected
                    ),
                ));
            }
        }

        check_business_rules(&output, catalog, allowed_labels)?;

        let RawClassifierOutput {
            dictionary_version,
            sentiment,
            priority,
            topics,
        } = output;

        let mut checked = Vec::with_capacity(topics.len());
        for (idx, topic) in topics.into_iter().enumerate() {
            let evidence =
                self.verify_topic_evidence(idx, &topic.evidence, canonical_text, &mut warnings);
            checked.push(CheckedTopic {
                label_id: topic.label_id,
                confidence_raw: topic.confidence,
                keywords: topic.keywords,
                evidence,
            });
        }

        let evidence_outcome = self
            .config
            .evidence_policy
            .evaluate(checked.iter().flat_map(|t| t.evidence.iter()));
        if !evidence_outcome.passed {
            return Err(evidence_rejection(&checked, &self.config.evidence_policy));
        }

        Ok(CheckedOutput {
            dictionary_version,
            sentiment,
            priority,
            topics: checked,
            warnings,
            evidence_outcome,
        })
    }

    /// Stages 4-6 on a checked output: resolve keywords, quality warnings, dedup.
    pub fn normalize(
        &self,
        checked: CheckedOutput,
        catalog: &CandidateCatalog,
    ) -> Result<ValidatedOutput, ResolveError> {
        let CheckedOutput {
            dictionary_version,
            sentiment,
            priority,
            topics,
            mut warnings,
            evidence_outcome,
        } = checked;

        let resolution = self.resolver.resolve(topics, catalog)?;
        warnings.extend(resolution.warnings);

        for (idx, topic) in resolution.topics.iter().enumerate() {
            quality_warnings(idx, topic, &mut warnings);
        }

        let topics = dedup_topics(resolution.topics, &mut warnings);

        info!(
            topics = topics.len(),
            warnings = warnings.len(),
            "Classifier output validated"
        );

        Ok(ValidatedOutput {
            dictionary_version,
            sentiment,
            classifier_priority: priority,
            topics,
            warnings,
            evidence_outcome,
        })
    }

    fn verify_topic_evidence(
        &self,
        idx: usize,
        evidence: &[RawEvidence],
        canonical_text: &str,
        warnings: &mut Vec<Warning>,
    ) -> Vec<EvidenceItem> {
        let verification = self.verifier.verify(evidence, canonical_text);
        warnings.extend(verification.warnings.into_iter().map(|mut w| {
            w.field = format!("topics[{}].{}", idx, w.field);
            w
        }));
        verification.items
    }
}

/// Labels must come from the closed taxonomy and every referenced id from the catalog.
/// All offending fields are reported; invented references take precedence as the code.
fn check_business_rules(
    output: &RawClassifierOutput,
    catalog: &CandidateCatalog,
    allowed_labels: &[String],
) -> Result<(), Rejection> {
    let mut invented = Vec::new();
    let mut invalid_labels = Vec::new();

    for (t_idx, topic) in output.topics.iter().enumerate() {
        if !allowed_labels.iter().any(|l| *l == topic.label_id) {
            invalid_labels.push(Violation::new(
                format!("topics[{}].labelid", t_idx),
                format!("label '{}' is not in the allowed label set", topic.label_id),
            ));
        }

        for (k_idx, reference) in topic.keywords.iter().enumerate() {
            if !catalog.contains(&reference.candidate_id) {
                warn!(
                    label_id = %topic.label_id,
                    candidate_id = %reference.candidate_id,
                    "Classifier referenced a candidate absent from the catalog"
                );
                invented.push(Violation::new(
                    format!("topics[{}].keywordsintext[{}].candidateid", t_idx, k_idx),
                    format!("candidate '{}' does not exist in the catalog", reference.candidate_id),
                ));
            }
        }
    }

    if !invented.is_empty() {
        invented.extend(invalid_labels);
        return Err(Rejection::new(ErrorCode::InventedReference, invented));
    }
    if !invalid_labels.is_empty() {
        return Err(Rejection::new(ErrorCode::InvalidLabel, invalid_labels));
    }
    Ok(())
}

fn evidence_rejection(topics: &[CheckedTopic], policy: &EvidencePolicy) -> Rejection {
    let violations = topics
        .iter()
        .enumerate()
        .flat_map(|(t_idx, topic)| {
            topic
                .evidence
                .iter()
                .enumerate()
                .filter(|(_, ev)| ev.verification == Verification::NotFound)
                .map(move |(e_idx, ev)| {
                    Violation::new(
                        format!("topics[{}].evidence[{}].quote", t_idx, e_idx),
                        format!(
                            "quote '{}' not found in text (failure threshold {:.2})",
                            preview(&ev.quote),
                            policy.max_failure_rate
                        ),
                    )
                })
        })
        .collect();
    Rejection::new(ErrorCode::EvidenceNotVerifiable, violations)
}

fn quality_warnings(idx: usize, topic: &TopicAssignment, warnings: &mut Vec<Warning>) {
    let field = format!("topics[{}]", idx);

    if topic.confidence_raw < MIN_CONFIDENCE_WARNING {
        warnings.push(Warning::new(
            WarningCode::LowConfidence,
            format!("{}.confidence", field),
            format!(
                "label '{}' has confidence {:.2} below {:.2}",
                topic.label_id, topic.confidence_raw, MIN_CONFIDENCE_WARNING
            ),
        ));
    }
    if topic.keywords.is_empty() {
        warnings.push(Warning::new(
            WarningCode::NoKeywords,
            format!("{}.keywordsintext", field),
            format!("label '{}' has no keywords", topic.label_id),
        ));
    }
    if topic.evidence.is_empty() {
        warnings.push(Warning::new(
            WarningCode::NoEvidence,
            format!("{}.evidence", field),
            format!("label '{}' has no evidence", topic.label_id),
        ));
    }
}

/// Keeps the first topic per label and the first keyword per candidate id.
fn dedup_topics(topics: Vec<TopicAssignment>, warnings: &mut Vec<Warning>) -> Vec<TopicAssignment> {
    let mut seen_labels = HashSet::new();
    let mut out = Vec::with_capacity(topics.len());

    for (t_idx, mut topic) in topics.into_iter().enumerate() {
        if !seen_labels.insert(topic.label_id.clone()) {
            warnings.push(Warning::new(
                WarningCode::DuplicateTopic,
                format!("topics[{}]", t_idx),
                format!("duplicate label '{}' dropped", topic.label_id),
            ));
            continue;
        }

        let mut seen_ids = HashSet::new();
        let mut k_idx = 0;
        topic.keywords.retain(|kw| {
            let first = seen_ids.insert(kw.candidate_id.clone());
            if !first {
                warnings.push(Warning::new(
                    WarningCode::DuplicateKeyword,
                    format!("topics[{}].keywordsintext[{}]", t_idx, k_idx),
                    format!(
                        "duplicate candidate '{}' dropped from '{}'",
                        kw.candidate_id, topic.label_id
                    ),
                ));
            }
            k_idx += 1;
            first
        });

        out.push(topic);
    }

    out
}
