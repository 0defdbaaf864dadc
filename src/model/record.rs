use serde::{Deserialize, Serialize};

use super::diagnostics::Diagnostics;
use super::entity::Entity;
use super::observation::Observation;
use super::topic::TopicAssignment;
use super::triage::{ClassifierPriority, CustomerStatus, PriorityAssessment, Sentiment};
use super::version::PipelineVersion;
use crate::pipeline::PipelineState;

/// One fully reconciled record per message, ready for storage or routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledRecord {
    pub message_id: String,
    pub pipeline_version: PipelineVersion,
    pub topics: Vec<TopicAssignment>,
    pub sentiment: Sentiment,
    pub classifier_priority: ClassifierPriority,
    pub priority: PriorityAssessment,
    pub customer_status: CustomerStatus,
    pub merged_entities: Vec<Entity>,
    pub observations: Vec<Observation>,
    pub diagnostics: Diagnostics,
    pub final_state: PipelineState,
}

impl AssembledRecord {
    /// Serializes to compact JSON. Field order is fixed by the struct definitions.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
