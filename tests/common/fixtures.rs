//! A complaint about a wrong invoice, with its catalog, entities and classifier output.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use triage_enrich::entities::{
    EntityRecognizer, GazetteerEntry, GazetteerRecognizer, PatternRecognizer,
};
use triage_enrich::model::{
    Candidate, CandidateCatalog, CandidateSource, Entity, EntitySource, ModelType,
    PipelineVersion,
};
use triage_enrich::pipeline::{MessageInput, RecognizedEntities, RunContext};

pub const SUBJECT: &str = "Reclamo fattura di marzo";

pub const TEXT: &str = "Buongiorno,\nsono già cliente da anni. La fattura di marzo riporta un importo errato.\nVi chiedo di correggerla entro il 15 aprile.\nPotete scrivermi a mario.rossi@acme.it oppure chiamare il 02 12345678.\nCordiali saluti,\nMario Rossi";

pub fn candidate(id: &str, lemma: &str, score: f64) -> Candidate {
    Candidate {
        candidate_id: id.to_string(),
        term: lemma.to_string(),
        lemma: lemma.to_string(),
        count: 1,
        source: CandidateSource::Body,
        embedding_score: 0.75,
        composite_score: score,
    }
}

pub fn catalog() -> CandidateCatalog {
    CandidateCatalog::new(vec![
        candidate("F1", "fattura", 0.82),
        candidate("F2", "importo", 0.64),
        candidate("F3", "marzo", 0.41),
        candidate("F4", "errato", 0.55),
    ])
    .expect("valid catalog")
}

pub fn pipeline_version() -> PipelineVersion {
    PipelineVersion {
        dictionary_version: 4,
        model_version: "triage-2024-03".to_string(),
        model_type: ModelType::Chat,
        parser_version: "1.2.0".to_string(),
        stoplist_version: "it-2024-01".to_string(),
        ner_model_version: "it_core_news_lg-3.7".to_string(),
        schema_version: "v2".to_string(),
    }
}

pub fn gazetteer() -> GazetteerRecognizer {
    let mut lexicon = BTreeMap::new();
    lexicon.insert(
        "AZIENDA".to_string(),
        vec![GazetteerEntry {
            lemma: "ACME".to_string(),
            surface_forms: vec!["acme".to_string()],
        }],
    );
    GazetteerRecognizer::new(lexicon).expect("valid gazetteer")
}

/// Output of an external NER model: a name, a date and a token that overlaps the email.
pub fn statistical_entities() -> Vec<Entity> {
    vec![
        Entity::new("marzo", "DATE", 52, 57, EntitySource::Statistical, 0.88),
        Entity::new("mario.rossi", "PER", 149, 160, EntitySource::Statistical, 0.61),
        Entity::new("Mario Rossi", "PER", 218, 229, EntitySource::Statistical, 0.93),
    ]
}

pub fn message(message_id: &str) -> MessageInput {
    let pattern = PatternRecognizer::with_default_rules().expect("default rules compile");
    MessageInput {
        message_id: message_id.to_string(),
        subject: SUBJECT.to_string(),
        from_address: "mario.rossi@acme.it".to_string(),
        canonical_text: TEXT.to_string(),
        catalog: catalog(),
        pipeline_version: pipeline_version(),
        entities: RecognizedEntities {
            pattern: pattern.recognize(TEXT),
            gazetteer: gazetteer().recognize(TEXT),
            statistical: statistical_entities(),
        },
        vip: false,
    }
}

pub fn topic(label: &str, confidence: f64, ids: &[&str], quotes: &[&str]) -> Value {
    json!({
        "labelid": label,
        "confidence": confidence,
        "keywordsintext": ids.iter().map(|id| json!({ "candidateid": id })).collect::<Vec<_>>(),
        "evidence": quotes.iter().map(|q| json!({ "quote": q })).collect::<Vec<_>>(),
    })
}

pub fn raw_output(topics: Vec<Value>) -> String {
    json!({
        "dictionaryversion": 4,
        "sentiment": { "value": "negative", "confidence": 0.86 },
        "priority": { "value": "high", "confidence": 0.8, "signals": ["reclamo", "scadenza"] },
        "topics": topics,
    })
    .to_string()
}

/// Billing and complaint topics, an ungrounded topic and a duplicate of the first.
pub fn complaint_output() -> String {
    let mut billing = topic(
        "FATTURAZIONE",
        0.92,
        &["F1", "F3", "F2"],
        &["La fattura di marzo riporta un importo errato"],
    );
    billing["keywordsintext"][0]["lemma"] = json!("fatture");

    raw_output(vec![
        billing,
        topic("RECLAMO", 0.7, &["F4"], &["importo errato"]),
        topic("DOCUMENTI", 0.15, &[], &[]),
        topic("FATTURAZIONE", 0.4, &["F2"], &[]),
    ])
}

pub fn fixed_context() -> RunContext {
    RunContext::new(
        Utc.with_ymd_and_hms(2024, 3, 18, 8, 0, 0)
            .single()
            .expect("valid timestamp"),
    )
}
