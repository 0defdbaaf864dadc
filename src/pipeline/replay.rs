//! Recorded message bundles, replayed through the pipeline offline.

use serde::Deserialize;
use serde_json::Value;

use crate::confidence::CollisionIndex;
use crate::entities::EntityRecognizer;
use crate::model::{CandidateCatalog, Entity, PipelineVersion};

use super::classifier::ReplayClassifier;
use super::context::{MessageInput, RecognizedEntities};

/// Entities as recorded. Missing pattern or gazetteer lists are recomputed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundleEntities {
    #[serde(default)]
    pub pattern: Option<Vec<Entity>>,
    #[serde(default)]
    pub gazetteer: Option<Vec<Entity>>,
    #[serde(default)]
    pub statistical: Vec<Entity>,
}

/// One recorded message plus the classifier output it received.
///
/// `rawOutput` may be the JSON document itself or a string containing it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayBundle {
    pub message_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from_address: String,
    pub canonical_text: String,
    pub candidates: CandidateCatalog,
    pub pipeline_version: PipelineVersion,
    pub raw_output: Value,
    #[serde(default)]
    pub entities: BundleEntities,
    #[serde(default)]
    pub collision_index: Option<CollisionIndex>,
    #[serde(default)]
    pub vip: bool,
}

impl ReplayBundle {
    /// Raw output as the classifier would have returned it.
    pub fn raw_output_text(&self) -> String {
        match &self.raw_output {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }

    /// Splits the bundle into pipeline input, a classifier that replays the recorded output
    /// and the recorded collision index (empty when absent).
    pub fn into_parts(
        self,
        pattern: &dyn EntityRecognizer,
        gazetteer: &dyn EntityRecognizer,
    ) -> (MessageInput, ReplayClassifier, CollisionIndex) {
        let classifier = ReplayClassifier::new(self.raw_output_text());
        let text = self.canonical_text;

        let entities = RecognizedEntities {
            pattern: self
                .entities
                .pattern
                .unwrap_or_else(|| pattern.recognize(&text)),
            gazetteer: self
                .entities
                .gazetteer
                .unwrap_or_else(|| gazetteer.recognize(&text)),
            statistical: self.entities.statistical,
        };

        let input = MessageInput {
            message_id: self.message_id,
            subject: self.subject,
            from_address: self.from_address,
            canonical_text: text,
            catalog: self.candidates,
            pipeline_version: self.pipeline_version,
            entities,
            vip: self.vip,
        };

        (input, classifier, self.collision_index.unwrap_or_default())
    }
}
