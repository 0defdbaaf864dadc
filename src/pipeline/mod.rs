//! Orchestration of the enrichment stages.
//!
//! `Validating → Resolving → Calibrating → MergingEntities → BuildingObservations →
//! Assembling → Done`, with `Rejected` reachable from `Validating` once classifier retries
//! are exhausted and `Failed` reachable from any stage.
//!
//! Messages share nothing but read-only snapshots, so [`Orchestrator::run_batch`] can fan
//! them out across tasks.

pub mod batch;
pub mod classifier;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod replay;
pub mod sink;
pub mod state;


pub use batch::BatchResult;
#[cfg(any(test, feature = "mock"))]
pub use classifier::MockClassifier;
pub use classifier::{Classifier, ClassifierRequest, ReplayClassifier};
pub use context::{CancellationFlag, MessageInput, RecognizedEntities, RunContext};
pub use error::{ClassifierError, FailureReport, PipelineError, SinkError, StageError};
pub use orchestrator::Orchestrator;
pub use replay::{BundleEntities, ReplayBundle};
#[cfg(any(test, feature = "mock"))]
pub use sink::{MockPayloadSink, RawPayload};
pub use sink::{NoPayloadSink, PayloadSink};
pub use state::PipelineState;
