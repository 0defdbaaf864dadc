use serde::Serialize;
use thiserror::Error;

use crate::model::{Diagnostics, ErrorCode};
use crate::observations::ObservationError;
use crate::resolver::ResolveError;

use super::state::PipelineState;

/// Failure of one classifier call.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("classifier timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Failure of the payload audit store.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("payload sink write failed: {reason}")]
    WriteFailed { reason: String },
}

/// Unrecoverable error raised by a pure stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Observation(#[from] ObservationError),
}

impl StageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StageError::Resolve(ResolveError::UnknownCandidate { .. }) => {
                ErrorCode::UnknownCandidate
            }
            StageError::Observation(ObservationError::UnknownCandidate { .. }) => {
                ErrorCode::UnknownCandidate
            }
        }
    }
}

/// Why a message did not reach `Done`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("message {message_id}: rejected after {attempts} attempt(s)")]
    Rejected {
        message_id: String,
        attempts: u32,
        diagnostics: Box<Diagnostics>,
    },

    #[error("message {message_id}: {stage} failed: {source}")]
    Stage {
        message_id: String,
        stage: PipelineState,
        #[source]
        source: StageError,
        /// Warnings, rejections and retries gathered before the failure.
        diagnostics: Box<Diagnostics>,
    },

    #[error("message {message_id}: cancelled before {stage}")]
    Cancelled {
        message_id: String,
        stage: PipelineState,
    },
}

impl PipelineError {
    pub(crate) fn stage(
        message_id: &str,
        stage: PipelineState,
        source: impl Into<StageError>,
        diagnostics: Diagnostics,
    ) -> Self {
        PipelineError::Stage {
            message_id: message_id.to_string(),
            stage,
            source: source.into(),
            diagnostics: Box::new(diagnostics),
        }
    }

    /// Diagnostics gathered up to the point of failure. Cancellation carries none.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            PipelineError::Rejected { diagnostics, .. }
            | PipelineError::Stage { diagnostics, .. } => Some(&**diagnostics),
            PipelineError::Cancelled { .. } => None,
        }
    }

    pub fn message_id(&self) -> &str {
        match self {
            PipelineError::Rejected { message_id, .. }
            | PipelineError::Stage { message_id, .. }
            | PipelineError::Cancelled { message_id, .. } => message_id,
        }
    }

    /// Stage in which processing stopped.
    pub fn failed_stage(&self) -> PipelineState {
        match self {
            PipelineError::Rejected { .. } => PipelineState::Validating,
            PipelineError::Stage { stage, .. } | PipelineError::Cancelled { stage, .. } => *stage,
        }
    }

    /// Terminal state: `Rejected` after exhausted retries, `Failed` otherwise.
    pub fn final_state(&self) -> PipelineState {
        match self {
            PipelineError::Rejected { .. } => PipelineState::Rejected,
            _ => PipelineState::Failed,
        }
    }

    /// Code of the error; for rejections, the code of the last attempt.
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::Rejected { diagnostics, .. } => diagnostics
                .rejections
                .last()
                .map(|r| r.code)
                .unwrap_or(ErrorCode::ClassifierUnavailable),
            PipelineError::Stage { source, .. } => source.code(),
            PipelineError::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }

    pub fn report(&self) -> FailureReport {
        let diagnostics = self.diagnostics().cloned();
        FailureReport {
            message_id: self.message_id().to_string(),
            final_state: self.final_state(),
            stage: self.failed_stage(),
            code: self.code(),
            error: self.to_string(),
            diagnostics,
        }
    }
}

/// Serializable account of a message that did not reach `Done`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub message_id: String,
    pub final_state: PipelineState,
    pub stage: PipelineState,
    pub code: ErrorCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}
