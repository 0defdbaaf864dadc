//! End-to-end pipeline tests over a realistic complaint message.

mod common;

use std::sync::Arc;

use common::fixtures::{
    TEXT, complaint_output, fixed_context, message, pipeline_version, raw_output, topic,
};
use triage_enrich::config::EnrichConfig;
use triage_enrich::confidence::CollisionIndex;
use triage_enrich::hashing::observation_uuid;
use triage_enrich::metrics::PipelineMetrics;
use triage_enrich::model::{
    CustomerStatusSource, CustomerValue, EntitySource, ErrorCode, PriorityLevel, Verification,
    WarningCode,
};
use triage_enrich::observations::IdStrategy;
use triage_enrich::pipeline::{
    CancellationFlag, MockClassifier, MockPayloadSink, Orchestrator, PipelineState,
};

fn deterministic_config() -> EnrichConfig {
    EnrichConfig {
        observation_ids: IdStrategy::Deterministic,
        workers: 2,
        ..Default::default()
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn test_complaint_is_fully_enriched() {
    let orchestrator = Orchestrator::new(
        MockClassifier::always(complaint_output()),
        deterministic_config(),
    )
    .expect("orchestrator");

    let record = orchestrator
        .run(&message("msg-001"), &fixed_context())
        .await
        .expect("record");

    assert_eq!(record.final_state, PipelineState::Done);
    assert_eq!(record.pipeline_version, pipeline_version());

    let labels: Vec<&str> = record.topics.iter().map(|t| t.label_id.as_str()).collect();
    assert_eq!(labels, vec!["FATTURAZIONE", "RECLAMO", "DOCUMENTI"]);

    let billing = &record.topics[0];
    assert_eq!(billing.confidence_raw, 0.92);
    let ids: Vec<&str> = billing
        .keywords
        .iter()
        .map(|k| k.candidate_id.as_str())
        .collect();
    assert_eq!(ids, vec!["F1", "F3", "F2"]);
    assert_eq!(billing.keywords[0].lemma, "fattura");
    assert_eq!(billing.evidence[0].verification, Verification::Exact);

    // 0.3*0.7 + 0.4*0.55 + 0.2*0.5 + 0.1*1
    assert_close(record.topics[1].confidence_adjusted, 0.63);
    assert_eq!(record.topics[2].confidence_adjusted, 0.1);
    assert!(
        record
            .topics
            .iter()
            .all(|t| (0.0..=1.0).contains(&t.confidence_adjusted))
    );

    let diagnostics = &record.diagnostics;
    assert!(diagnostics.has_warning(WarningCode::RedundantField));
    assert!(diagnostics.has_warning(WarningCode::DuplicateTopic));
    assert!(diagnostics.has_warning(WarningCode::LowConfidence));
    assert!(diagnostics.has_warning(WarningCode::NoKeywords));
    assert!(diagnostics.evidence_policy_passed);
    assert_eq!(diagnostics.retry_count, 0);

    assert_eq!(record.customer_status.value, CustomerValue::Existing);
    assert_eq!(record.customer_status.source, CustomerStatusSource::TextSignal);

    assert_eq!(record.priority.value, PriorityLevel::Urgent);
    assert_eq!(
        record.priority.signals,
        vec!["urgent_keywords:1", "negative_sentiment", "deadline_mentioned"]
    );
}

#[tokio::test]
async fn test_entities_are_merged_without_overlap() {
    let orchestrator = Orchestrator::new(
        MockClassifier::always(complaint_output()),
        deterministic_config(),
    )
    .expect("orchestrator");

    let record = orchestrator
        .run(&message("msg-002"), &fixed_context())
        .await
        .expect("record");

    let merged: Vec<(&str, &str, EntitySource)> = record
        .merged_entities
        .iter()
        .map(|e| (e.text.as_str(), e.label.as_str(), e.source))
        .collect();
    assert_eq!(
        merged,
        vec![
            ("marzo", "DATE", EntitySource::Statistical),
            ("mario.rossi@acme.it", "EMAIL", EntitySource::Pattern),
            ("02 12345678", "TELEFONO", EntitySource::Pattern),
            ("Mario Rossi", "PER", EntitySource::Statistical),
        ]
    );

    for (i, a) in record.merged_entities.iter().enumerate() {
        for b in &record.merged_entities[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
        let text: String = TEXT.chars().skip(a.start).take(a.end - a.start).collect();
        assert_eq!(text, a.text);
    }
}

#[tokio::test]
async fn test_replays_are_byte_identical() {
    let orchestrator = Orchestrator::new(
        MockClassifier::always(complaint_output()),
        deterministic_config(),
    )
    .expect("orchestrator");
    let ctx = fixed_context();

    let first = orchestrator.run(&message("msg-003"), &ctx).await.expect("first");
    let second = orchestrator.run(&message("msg-003"), &ctx).await.expect("second");

    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());

    assert_eq!(first.observations.len(), 4);
    for obs in &first.observations {
        assert_eq!(
            obs.obs_id,
            observation_uuid("msg-003", &obs.label_id, &obs.candidate_id, 4)
        );
        assert_eq!(obs.observed_at, ctx.started_at);
    }
}

#[tokio::test]
async fn test_collision_lowers_adjusted_confidence() {
    let orchestrator = Orchestrator::new(
        MockClassifier::always(complaint_output()),
        deterministic_config(),
    )
    .expect("orchestrator");

    let baseline = orchestrator
        .run(&message("msg-004"), &fixed_context())
        .await
        .expect("baseline");

    let index: CollisionIndex = [("errato", "FATTURAZIONE"), ("errato", "ASSISTENZA_TECNICA")]
        .into_iter()
        .collect();
    let ctx = fixed_context().with_collision_source(Arc::new(index));
    let collided = orchestrator
        .run(&message("msg-004"), &ctx)
        .await
        .expect("collided");

    // errato under RECLAMO: 1 / |{FATTURAZIONE, ASSISTENZA_TECNICA, RECLAMO}|
    assert_close(
        baseline.topics[1].confidence_adjusted - collided.topics[1].confidence_adjusted,
        0.1 * (1.0 - 1.0 / 3.0),
    );
    assert_eq!(
        baseline.topics[0].confidence_adjusted,
        collided.topics[0].confidence_adjusted
    );
}

#[tokio::test]
async fn test_invented_reference_never_produces_output() {
    let invented = raw_output(vec![topic(
        "FATTURAZIONE",
        0.9,
        &["F1", "F99"],
        &["importo errato"],
    )]);
    let orchestrator = Orchestrator::new(MockClassifier::always(invented), deterministic_config())
        .expect("orchestrator");

    let err = orchestrator
        .run(&message("msg-005"), &fixed_context())
        .await
        .unwrap_err();

    assert_eq!(err.final_state(), PipelineState::Rejected);
    assert_eq!(err.code(), ErrorCode::InventedReference);
    assert_eq!(orchestrator.classifier().calls(), 3);

    let report = err.report();
    let diagnostics = report.diagnostics.expect("rejection diagnostics");
    assert_eq!(diagnostics.rejections.len(), 3);
    assert!(
        diagnostics.rejections[0]
            .violations
            .iter()
            .any(|v| v.field == "topics[0].keywordsintext[1].candidateid")
    );
}

#[tokio::test]
async fn test_write_barrier_and_metrics_across_messages() {
    let metrics = PipelineMetrics::new().expect("metrics");
    let invented = raw_output(vec![topic("FATTURAZIONE", 0.9, &["F99"], &[])]);
    let classifier = MockClassifier::new()
        .then_output(complaint_output())
        .then_output(invented.clone());
    let orchestrator = Orchestrator::new(classifier, deterministic_config())
        .expect("orchestrator")
        .with_payload_sink(MockPayloadSink::new())
        .with_metrics(metrics.clone());
    let ctx = fixed_context();

    let accepted = orchestrator
        .run(&message("msg-007"), &ctx)
        .await
        .expect("accepted");
    let rejected = orchestrator
        .run(&message("msg-008"), &ctx)
        .await
        .unwrap_err();

    let normalized = orchestrator.sink().normalized();
    assert_eq!(normalized.len(), 1);
    assert_eq!(normalized[0].message_id, "msg-007");
    assert_eq!(normalized[0], accepted);

    let raw = orchestrator.sink().raw_payloads();
    assert_eq!(raw.len(), 4);
    assert!(raw[1..].iter().all(|p| p.message_id == "msg-008" && p.raw_output == invented));

    let report = serde_json::to_value(rejected.report()).expect("report");
    assert_eq!(report["diagnostics"]["rejections"][2]["rawOutput"], invented);

    assert_eq!(metrics.barrier_blocks(), 1);
    assert_eq!(metrics.validation_errors(ErrorCode::InventedReference), 3);
    let exposition = metrics.export().expect("export");
    assert!(exposition.contains("triage_write_barrier_blocks_total 1"));
    assert!(exposition.contains("triage_span_status_total{status=\"exact\"} 2"));
}

#[tokio::test]
async fn test_recovers_when_a_later_attempt_is_valid() {
    let invented = raw_output(vec![topic("FATTURAZIONE", 0.9, &["F99"], &[])]);
    let classifier = MockClassifier::new()
        .then_output(invented)
        .then_output(complaint_output());
    let orchestrator =
        Orchestrator::new(classifier, deterministic_config()).expect("orchestrator");

    let record = orchestrator
        .run(&message("msg-006"), &fixed_context())
        .await
        .expect("record");

    assert_eq!(record.diagnostics.retry_count, 1);
    assert_eq!(
        record.diagnostics.rejections[0].code,
        ErrorCode::InventedReference
    );
    assert_eq!(record.topics.len(), 3);
}

#[tokio::test]
async fn test_cancelled_batch_fails_every_message() {
    let orchestrator = Arc::new(
        Orchestrator::new(
            MockClassifier::always(complaint_output()),
            deterministic_config(),
        )
        .expect("orchestrator"),
    );
    let cancel = CancellationFlag::new();
    cancel.cancel();
    let ctx = fixed_context().with_cancellation(cancel);

    let results = Arc::clone(&orchestrator)
        .run_batch(vec![message("c-1"), message("c-2")], ctx)
        .await;

    assert_eq!(results.len(), 2);
    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.final_state(), PipelineState::Failed);
        assert_eq!(err.code(), ErrorCode::Cancelled);
    }
    assert_eq!(orchestrator.classifier().calls(), 0);
}

#[tokio::test]
async fn test_batch_results_match_single_runs() {
    let orchestrator = Arc::new(
        Orchestrator::new(
            MockClassifier::always(complaint_output()),
            deterministic_config(),
        )
        .expect("orchestrator"),
    );
    let ctx = fixed_context();
    let single = orchestrator
        .run(&message("b-1"), &ctx)
        .await
        .expect("single");

    let mut results: Vec<_> = Arc::clone(&orchestrator)
        .run_batch(vec![message("b-2"), message("b-1"), message("b-3")], ctx)
        .await
        .into_iter()
        .map(|r| r.expect("record"))
        .collect();
    results.sort_by(|a, b| a.message_id.cmp(&b.message_id));

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].to_json().unwrap(), single.to_json().unwrap());
}
