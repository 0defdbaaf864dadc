use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::confidence::{CollisionIndex, CollisionSource};
use crate::model::{CandidateCatalog, Entity, PipelineVersion};

/// Entities produced by the three recognizers before merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedEntities {
    #[serde(default)]
    pub pattern: Vec<Entity>,
    #[serde(default)]
    pub gazetteer: Vec<Entity>,
    #[serde(default)]
    pub statistical: Vec<Entity>,
}

/// Everything known about one message before classification.
#[derive(Debug, Clone)]
pub struct MessageInput {
    pub message_id: String,
    pub subject: String,
    pub from_address: String,
    pub canonical_text: String,
    pub catalog: CandidateCatalog,
    pub pipeline_version: PipelineVersion,
    pub entities: RecognizedEntities,
    pub vip: bool,
}

/// Shared cancellation signal. Checked between stages, never mid-stage.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-run inputs that are not part of the message: the frozen start timestamp, the
/// collision index source and the cancellation flag.
#[derive(Clone)]
pub struct RunContext {
    pub started_at: DateTime<Utc>,
    pub cancel: CancellationFlag,
    pub collisions: Arc<dyn CollisionSource>,
}

impl RunContext {
    /// Context with an empty collision index.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            cancel: CancellationFlag::new(),
            collisions: Arc::new(CollisionIndex::new()),
        }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn with_collision_source(mut self, source: Arc<dyn CollisionSource>) -> Self {
        self.collisions = source;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("started_at", &self.started_at)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
