use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::config::EnrichConfig;
use crate::confidence::{CalibrationWeights, ConfidenceCalibrator, load_collision_index};
use crate::customer::{CustomerError, CustomerLookup, NoCustomerLookup, status_from_lookup};
use crate::entities::EntityMerger;
use crate::metrics::PipelineMetrics;
use crate::model::{
    AssembledRecord, CustomerStatus, Diagnostics, ErrorCode, Rejection, Warning, WarningCode,
};
use crate::observations::ObservationBuilder;
use crate::priority::{PriorityError, PriorityScorer, PrioritySignals};
use crate::validation::{CheckedOutput, SchemaValidator};

use super::classifier::{Classifier, ClassifierRequest};
use super::context::{MessageInput, RunContext};
use super::error::{ClassifierError, PipelineError, StageError};
use super::sink::{NoPayloadSink, PayloadSink};
use super::state::PipelineState;

/// Stage in progress and when it was entered.
struct StageClock {
    stage: PipelineState,
    started: Instant,
}

/// Sequences the stages for one message behind a fail-fast validation barrier.
///
/// Only `Validating` is retried (by re-invoking the classifier). Every later stage is pure;
/// an error there moves the message straight to `Failed`. Raw classifier output goes to the
/// [`PayloadSink`] on every attempt; the normalized record only once the message is `Done`.
pub struct Orchestrator<
    C: Classifier,
    L: CustomerLookup = NoCustomerLookup,
    S: PayloadSink = NoPayloadSink,
> {
    classifier: C,
    lookup: L,
    sink: S,
    config: EnrichConfig,
    calibrator: ConfidenceCalibrator,
    merger: EntityMerger,
    observations: ObservationBuilder,
    priority: PriorityScorer,
    metrics: Option<PipelineMetrics>,
}

impl<C: Classifier, L: CustomerLookup, S: PayloadSink> std::fmt::Debug for Orchestrator<C, L, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("calibrator", &self.calibrator)
            .field("observations", &self.observations)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Classifier> Orchestrator<C, NoCustomerLookup, NoPayloadSink> {
    pub fn new(classifier: C, config: EnrichConfig) -> Result<Self, PriorityError> {
        Ok(Self {
            classifier,
            lookup: NoCustomerLookup,
            sink: NoPayloadSink,
            observations: ObservationBuilder::with_id_strategy(config.observation_ids),
            config,
            calibrator: ConfidenceCalibrator::new(),
            merger: EntityMerger::new(),
            priority: PriorityScorer::new()?,
            metrics: None,
        })
    }
}

impl<C: Classifier, L: CustomerLookup, S: PayloadSink> Orchestrator<C, L, S> {
    /// Replaces the CRM boundary.
    pub fn with_customer_lookup<L2: CustomerLookup>(self, lookup: L2) -> Orchestrator<C, L2, S> {
        Orchestrator {
            classifier: self.classifier,
            lookup,
            sink: self.sink,
            config: self.config,
            calibrator: self.calibrator,
            merger: self.merger,
            observations: self.observations,
            priority: self.priority,
            metrics: self.metrics,
        }
    }

    /// Replaces the payload audit store.
    pub fn with_payload_sink<S2: PayloadSink>(self, sink: S2) -> Orchestrator<C, L, S2> {
        Orchestrator {
            classifier: self.classifier,
            lookup: self.lookup,
            sink,
            config: self.config,
            calibrator: self.calibrator,
            merger: self.merger,
            observations: self.observations,
            priority: self.priority,
            metrics: self.metrics,
        }
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_calibration_weights(mut self, weights: CalibrationWeights) -> Self {
        self.calibrator = ConfidenceCalibrator::with_weights(weights);
        self
    }

    pub fn with_priority_scorer(mut self, scorer: PriorityScorer) -> Self {
        self.priority = scorer;
        self
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn metrics(&self) -> Option<&PipelineMetrics> {
        self.metrics.as_ref()
    }

    /// Runs one message to a terminal state.
    ///
    /// Returns the assembled record on `Done`. `Rejected` and `Failed` come back as
    /// [`PipelineError`] carrying the stage and the diagnostics gathered so far.
    #[instrument(skip_all, fields(message_id = %input.message_id, pipeline = %input.pipeline_version.tag()))]
    pub async fn run(
        &self,
        input: &MessageInput,
        ctx: &RunContext,
    ) -> Result<AssembledRecord, PipelineError> {
        let started = Instant::now();
        let mut clock = None;
        let result = self.run_stages(input, ctx, &mut clock).await;
        self.close_stage(&mut clock);

        match &result {
            Ok(record) => {
                if let Err(e) = self.sink.record_normalized(&record.message_id, record).await {
                    error!(error = %e, "Normalized record not persisted");
                }
                info!(
                    topics = record.topics.len(),
                    entities = record.merged_entities.len(),
                    observations = record.observations.len(),
                    warnings = record.diagnostics.warnings.len(),
                    retries = record.diagnostics.retry_count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Message enriched"
                );
            }
            Err(PipelineError::Rejected { .. }) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_barrier_block();
                }
                debug!("Write barrier held, normalized record withheld");
            }
            Err(_) => {}
        }

        result
    }

    async fn run_stages(
        &self,
        input: &MessageInput,
        ctx: &RunContext,
        clock: &mut Option<StageClock>,
    ) -> Result<AssembledRecord, PipelineError> {
        let message_id = input.message_id.as_str();
        let dict_version = input.pipeline_version.dictionary_version;
        let mut diagnostics = Diagnostics::default();

        self.enter(ctx, clock, message_id, PipelineState::Validating)?;
        let (collisions, collision_warning) = load_collision_index(ctx.collisions.as_ref());
        let checked = self
            .validate_with_retry(input, ctx, clock, &mut diagnostics)
            .await?;

        self.enter(ctx, clock, message_id, PipelineState::Resolving)?;
        let mut validated = self
            .validator(dict_version)
            .normalize(checked, &input.catalog)
            .map_err(|e| {
                self.fail(
                    message_id,
                    PipelineState::Resolving,
                    e,
                    std::mem::take(&mut diagnostics),
                )
            })?;
        diagnostics.warnings.append(&mut validated.warnings);
        diagnostics.evidence_policy_passed = validated.evidence_outcome.passed;

        let customer_status = self.customer_status(input).await;
        let priority = self.priority.score(&PrioritySignals {
            subject: &input.subject,
            body: &input.canonical_text,
            sentiment: validated.sentiment.value,
            customer: customer_status.value,
            vip: input.vip,
        });

        self.enter(ctx, clock, message_id, PipelineState::Calibrating)?;
        diagnostics.warnings.extend(collision_warning);
        self.calibrator
            .calibrate_all(&mut validated.topics, &collisions);

        self.enter(ctx, clock, message_id, PipelineState::MergingEntities)?;
        let merged_entities = self.merger.merge(
            &input.entities.pattern,
            &input.entities.gazetteer,
            &input.entities.statistical,
        );

        self.enter(ctx, clock, message_id, PipelineState::BuildingObservations)?;
        let observations = self
            .observations
            .build(
                message_id,
                &validated.topics,
                &input.catalog,
                dict_version,
                ctx.started_at,
            )
            .map_err(|e| {
                self.fail(
                    message_id,
                    PipelineState::BuildingObservations,
                    e,
                    std::mem::take(&mut diagnostics),
                )
            })?;

        self.enter(ctx, clock, message_id, PipelineState::Assembling)?;
        Ok(AssembledRecord {
            message_id: input.message_id.clone(),
            pipeline_version: input.pipeline_version.clone(),
            topics: validated.topics,
            sentiment: validated.sentiment,
            classifier_priority: validated.classifier_priority,
            priority,
            customer_status,
            merged_entities,
            observations,
            diagnostics,
            final_state: PipelineState::Done,
        })
    }

    fn validator(&self, dict_version: u32) -> SchemaValidator {
        let validator = SchemaValidator::with_config(self.config.validator_config(dict_version));
        match &self.metrics {
            Some(metrics) => validator.with_metrics(metrics.clone()),
            None => validator,
        }
    }

    /// The `Validating` loop: classify, then check, at most `max_retries` times.
    ///
    /// Checking runs on the blocking pool; the fuzzy evidence search is CPU-bound.
    async fn validate_with_retry(
        &self,
        input: &MessageInput,
        ctx: &RunContext,
        clock: &mut Option<StageClock>,
        diagnostics: &mut Diagnostics,
    ) -> Result<CheckedOutput, PipelineError> {
        let validator = self.validator(input.pipeline_version.dictionary_version);
        let max_attempts = self.config.max_retries.max(1);

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.enter(ctx, clock, &input.message_id, PipelineState::Validating)?;
            }

            let request = ClassifierRequest {
                message_id: &input.message_id,
                canonical_text: &input.canonical_text,
                catalog: &input.catalog,
                pipeline_version: &input.pipeline_version,
                attempt,
            };

            let verdict = match self.call_classifier(&request).await {
                Ok(raw) => {
                    if let Err(e) = self.sink.record_raw(&input.message_id, attempt, &raw).await {
                        warn!(attempt, error = %e, "Raw classifier output not persisted");
                    }
                    self.check_blocking(&validator, input, raw).await?
                }
                Err(e) => {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_validation_error(ErrorCode::ClassifierUnavailable);
                    }
                    Err(Rejection::single(
                        ErrorCode::ClassifierUnavailable,
                        "classifier",
                        e.to_string(),
                    ))
                }
            };

            let rejection = match verdict {
                Ok(mut checked) => {
                    diagnostics.retry_count = attempt - 1;
                    diagnostics.warnings.append(&mut checked.warnings);
                    debug!(attempt, "Classifier output accepted");
                    return Ok(checked);
                }
                Err(rejection) => rejection.with_attempt(attempt),
            };

            let retryable = rejection.code.is_retryable();
            let code = rejection.code;
            diagnostics.rejections.push(rejection);
            diagnostics.retry_count = attempt - 1;

            if !retryable || attempt == max_attempts {
                break;
            }

            warn!(attempt, code = %code, "Classifier output rejected, retrying");
            diagnostics.warnings.push(Warning::new(
                WarningCode::ClassifierRetry,
                "classifier",
                format!("attempt {} rejected with {}, retrying", attempt, code),
            ));
        }

        let attempts = diagnostics.retry_count + 1;
        error!(
            attempts,
            code = ?diagnostics.rejections.last().map(|r| r.code),
            "Message rejected"
        );
        Err(PipelineError::Rejected {
            message_id: input.message_id.clone(),
            attempts,
            diagnostics: Box::new(std::mem::take(diagnostics)),
        })
    }

    /// Runs [`SchemaValidator::check`] off the async workers. A rejection keeps the raw output
    /// it was raised on.
    async fn check_blocking(
        &self,
        validator: &SchemaValidator,
        input: &MessageInput,
        raw: String,
    ) -> Result<Result<CheckedOutput, Rejection>, PipelineError> {
        let validator = validator.clone();
        let catalog = input.catalog.clone();
        let canonical_text = input.canonical_text.clone();
        let allowed_labels = self.config.allowed_labels.clone();

        let joined = tokio::task::spawn_blocking(move || {
            validator
                .check(&raw, &catalog, &canonical_text, &allowed_labels)
                .map_err(|rejection| rejection.with_raw_output(raw))
        })
        .await;

        match joined {
            Ok(verdict) => Ok(verdict),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(error = %e, "Validation task aborted");
                Err(PipelineError::Cancelled {
                    message_id: input.message_id.clone(),
                    stage: PipelineState::Validating,
                })
            }
        }
    }

    async fn call_classifier(&self, request: &ClassifierRequest<'_>) -> Result<String, ClassifierError> {
        let timeout = self.config.classifier_timeout();
        match tokio::time::timeout(timeout, self.classifier.classify(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout {
                timeout_ms: self.config.classifier_timeout_ms,
            }),
        }
    }

    async fn customer_status(&self, input: &MessageInput) -> CustomerStatus {
        let timeout = self.config.classifier_timeout();
        let result =
            match tokio::time::timeout(timeout, self.lookup.lookup(&input.from_address)).await {
                Ok(result) => result,
                Err(_) => Err(CustomerError::Timeout {
                    timeout_ms: self.config.classifier_timeout_ms,
                }),
            };
        status_from_lookup(result, &input.canonical_text)
    }

    /// Closes the running stage, then checks cancellation and opens `stage`.
    fn enter(
        &self,
        ctx: &RunContext,
        clock: &mut Option<StageClock>,
        message_id: &str,
        stage: PipelineState,
    ) -> Result<(), PipelineError> {
        self.close_stage(clock);
        if ctx.is_cancelled() {
            warn!(stage = %stage, "Message cancelled");
            return Err(PipelineError::Cancelled {
                message_id: message_id.to_string(),
                stage,
            });
        }
        debug!(stage = %stage, "Entering stage");
        *clock = Some(StageClock {
            stage,
            started: Instant::now(),
        });
        Ok(())
    }

    fn close_stage(&self, clock: &mut Option<StageClock>) {
        if let (Some(running), Some(metrics)) = (clock.take(), &self.metrics) {
            metrics.observe_stage(running.stage, running.started.elapsed());
        }
    }

    fn fail(
        &self,
        message_id: &str,
        stage: PipelineState,
        source: impl Into<StageError>,
        diagnostics: Diagnostics,
    ) -> PipelineError {
        let err = PipelineError::stage(message_id, stage, source, diagnostics);
        error!(stage = %stage, error = %err, "Message failed");
        err
    }
}
