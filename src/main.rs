//! Replay entrypoint: runs one recorded message bundle through the pipeline.
//!
//! Usage: `triage-enrich <input.json> [output.json]`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;

use triage_enrich::config::EnrichConfig;
use triage_enrich::entities::{GazetteerEntry, GazetteerRecognizer, PatternRecognizer};
use triage_enrich::metrics::PipelineMetrics;
use triage_enrich::pipeline::{Orchestrator, ReplayBundle, RunContext};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(input_path) = args.next().map(PathBuf::from) else {
        anyhow::bail!("usage: triage-enrich <input.json> [output.json]");
    };
    let output_path = args.next().map(PathBuf::from);

    let config = EnrichConfig::from_env()?;
    config.validate()?;

    let bundle: ReplayBundle = serde_json::from_str(
        &std::fs::read_to_string(&input_path)
            .with_context(|| format!("failed to read {}", input_path.display()))?,
    )
    .with_context(|| format!("failed to parse bundle {}", input_path.display()))?;

    tracing::info!(
        message_id = %bundle.message_id,
        pipeline = %bundle.pipeline_version.tag(),
        "Replaying bundle"
    );

    let pattern = PatternRecognizer::with_default_rules()?;
    let gazetteer = match &config.gazetteer_path {
        Some(path) => load_gazetteer(path)?,
        None => GazetteerRecognizer::default(),
    };

    let (input, classifier, collisions) = bundle.into_parts(&pattern, &gazetteer);
    let ctx = RunContext::now().with_collision_source(Arc::new(collisions));
    let metrics_path = config.metrics_path.clone();
    let metrics = PipelineMetrics::new()?;
    let orchestrator = Orchestrator::new(classifier, config)?.with_metrics(metrics.clone());

    let (json, done) = match orchestrator.run(&input, &ctx).await {
        Ok(record) => (serde_json::to_string_pretty(&record)?, true),
        Err(e) => (serde_json::to_string_pretty(&e.report())?, false),
    };

    match output_path {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    if let Some(path) = metrics_path {
        std::fs::write(&path, metrics.export()?)
            .with_context(|| format!("failed to write metrics {}", path.display()))?;
    }

    if !done {
        std::process::exit(2);
    }
    Ok(())
}

fn load_gazetteer(path: &Path) -> anyhow::Result<GazetteerRecognizer> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read gazetteer {}", path.display()))?;
    let lexicon: BTreeMap<String, Vec<GazetteerEntry>> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse gazetteer {}", path.display()))?;
    let recognizer = GazetteerRecognizer::new(lexicon)?;
    tracing::info!(entries = recognizer.len(), "Gazetteer loaded");
    Ok(recognizer)
}
