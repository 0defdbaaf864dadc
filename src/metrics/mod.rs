//! Prometheus instrumentation for the pipeline.
//!
//! Every metric is registered in an injectable [`Registry`], so an embedder can expose
//! these next to its own and tests can read the values back.
//!
//! | Metric | Labels |
//! |---|---|
//! | `triage_validation_errors_total` | `code` |
//! | `triage_span_status_total` | `status` (`exact`, `fuzzy`, `not_found`) |
//! | `triage_stage_duration_seconds` | `stage` |
//! | `triage_write_barrier_blocks_total` | none |

pub mod error;


pub use error::MetricsError;

use std::sync::Arc;
use std::time::Duration;

use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry,
};

use crate::model::{ErrorCode, Verification};
use crate::pipeline::PipelineState;

/// Stage latency buckets in seconds. `Validating` includes the classifier round trip.
const STAGE_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0,
];

/// Pipeline counters and histograms. Cloning shares the underlying metrics.
#[derive(Clone)]
pub struct PipelineMetrics {
    validation_errors_total: IntCounterVec,
    span_status_total: IntCounterVec,
    stage_duration_seconds: HistogramVec,
    write_barrier_blocks_total: IntCounter,
    registry: Arc<Registry>,
}

impl std::fmt::Debug for PipelineMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineMetrics").finish_non_exhaustive()
    }
}

impl PipelineMetrics {
    /// Metrics in a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    /// Registers the pipeline metrics in `registry`.
    ///
    /// Fails if the registry already holds metrics with the same names.
    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let validation_errors_total = register_int_counter_vec_with_registry!(
            "triage_validation_errors_total",
            "Classifier attempts rejected by validation, by error code",
            &["code"],
            registry
        )?;

        let span_status_total = register_int_counter_vec_with_registry!(
            "triage_span_status_total",
            "Evidence quotes by verification outcome",
            &["status"],
            registry
        )?;

        let stage_duration_seconds = register_histogram_vec_with_registry!(
            "triage_stage_duration_seconds",
            "Time spent in each pipeline stage in seconds",
            &["stage"],
            STAGE_BUCKETS.to_vec(),
            registry
        )?;

        let write_barrier_blocks_total = register_int_counter_with_registry!(
            "triage_write_barrier_blocks_total",
            "Messages whose normalized output was withheld after rejection",
            registry
        )?;

        Ok(Self {
            validation_errors_total,
            span_status_total,
            stage_duration_seconds,
            write_barrier_blocks_total,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_validation_error(&self, code: ErrorCode) {
        let code = code.to_string();
        self.validation_errors_total
            .with_label_values(&[code.as_str()])
            .inc();
    }

    pub fn record_span_status(&self, verification: Verification) {
        self.span_status_total
            .with_label_values(&[verification.as_str()])
            .inc();
    }

    pub fn observe_stage(&self, stage: PipelineState, elapsed: Duration) {
        let stage = stage.to_string();
        self.stage_duration_seconds
            .with_label_values(&[stage.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_barrier_block(&self) {
        self.write_barrier_blocks_total.inc();
    }

    pub fn validation_errors(&self, code: ErrorCode) -> u64 {
        let code = code.to_string();
        self.validation_errors_total
            .with_label_values(&[code.as_str()])
            .get()
    }

    pub fn span_status(&self, verification: Verification) -> u64 {
        self.span_status_total
            .with_label_values(&[verification.as_str()])
            .get()
    }

    /// Number of timings recorded for `stage`.
    pub fn stage_samples(&self, stage: PipelineState) -> u64 {
        let stage = stage.to_string();
        self.stage_duration_seconds
            .with_label_values(&[stage.as_str()])
            .get_sample_count()
    }

    pub fn barrier_blocks(&self) -> u64 {
        self.write_barrier_blocks_total.get()
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
