use tracing::debug;

use crate::model::{CandidateCatalog, ResolvedKeyword, TopicAssignment, Warning, WarningCode};
use crate::validation::{CheckedTopic, RawKeywordReference};

use super::error::ResolveError;

/// Resolved topics and the warnings raised while resolving them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub topics: Vec<TopicAssignment>,
    pub warnings: Vec<Warning>,
}

/// Replaces untrusted keyword references with catalog-backed [`ResolvedKeyword`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogResolver;

impl CatalogResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves every keyword of every topic. Fails on the first id absent from `catalog`;
    /// no partial result is returned.
    pub fn resolve(
        &self,
        topics: Vec<CheckedTopic>,
        catalog: &CandidateCatalog,
    ) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution {
            topics: Vec::with_capacity(topics.len()),
            warnings: Vec::new(),
        };

        for (t_idx, topic) in topics.into_iter().enumerate() {
            let mut keywords = Vec::with_capacity(topic.keywords.len());

            for (k_idx, reference) in topic.keywords.iter().enumerate() {
                let field = format!("topics[{}].keywordsintext[{}]", t_idx, k_idx);
                keywords.push(self.resolve_keyword(
                    &topic.label_id,
                    reference,
                    catalog,
                    &field,
                )?);

                for echoed in &reference.echoed_fields {
                    resolution.warnings.push(Warning::new(
                        WarningCode::RedundantField,
                        format!("{}.{}", field, echoed),
                        format!(
                            "field '{}' ignored for candidate '{}'; catalog value used",
                            echoed, reference.candidate_id
                        ),
                    ));
                }
            }

            debug!(
                label_id = %topic.label_id,
                keywords = keywords.len(),
                "Resolved topic keywords from catalog"
            );

            resolution.topics.push(TopicAssignment {
                label_id: topic.label_id,
                confidence_raw: topic.confidence_raw,
                confidence_adjusted: topic.confidence_raw,
                keywords,
                evidence: topic.evidence,
            });
        }

        Ok(resolution)
    }

    pub fn resolve_keyword(
        &self,
        label_id: &str,
        reference: &RawKeywordReference,
        catalog: &CandidateCatalog,
        field: &str,
    ) -> Result<ResolvedKeyword, ResolveError> {
        catalog
            .get(&reference.candidate_id)
            .map(ResolvedKeyword::from)
            .ok_or_else(|| ResolveError::UnknownCandidate {
                label_id: label_id.to_string(),
                candidate_id: reference.candidate_id.clone(),
                field: field.to_string(),
            })
    }
}
