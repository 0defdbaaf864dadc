use serde::{Deserialize, Serialize};

/// Orchestrator states. `Done`, `Rejected` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Validating,
    Resolving,
    Calibrating,
    MergingEntities,
    BuildingObservations,
    Assembling,
    Done,
    Rejected,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Done | PipelineState::Rejected | PipelineState::Failed
        )
    }

    /// The state that follows on success. `None` for terminal states.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Validating => Some(PipelineState::Resolving),
            PipelineState::Resolving => Some(PipelineState::Calibrating),
            PipelineState::Calibrating => Some(PipelineState::MergingEntities),
            PipelineState::MergingEntities => Some(PipelineState::BuildingObservations),
            PipelineState::BuildingObservations => Some(PipelineState::Assembling),
            PipelineState::Assembling => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Rejected | PipelineState::Failed => None,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Validating => "validating",
            PipelineState::Resolving => "resolving",
            PipelineState::Calibrating => "calibrating",
            PipelineState::MergingEntities => "merging_entities",
            PipelineState::BuildingObservations => "building_observations",
            PipelineState::Assembling => "assembling",
            PipelineState::Done => "done",
            PipelineState::Rejected => "rejected",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}
