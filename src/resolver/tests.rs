use super::*;
use crate::model::{Candidate, CandidateCatalog, CandidateSource, ErrorCode, Rejection, WarningCode};
use crate::validation::{CheckedTopic, RawKeywordReference};

fn catalog() -> CandidateCatalog {
    CandidateCatalog::new(vec![
        Candidate {
            candidate_id: "A".to_string(),
            term: "contratti".to_string(),
            lemma: "contratto".to_string(),
            count: 3,
            source: CandidateSource::Subject,
            embedding_score: 0.72,
            composite_score: 0.8,
        },
        Candidate {
            candidate_id: "B".to_string(),
            term: "bolletta".to_string(),
            lemma: "bolletta".to_string(),
            count: 1,
            source: CandidateSource::Body,
            embedding_score: 0.41,
            composite_score: 0.35,
        },
    ])
    .expect("valid catalog")
}

fn checked(label: &str, keywords: Vec<RawKeywordReference>) -> CheckedTopic {
    CheckedTopic {
        label_id: label.to_string(),
        confidence_raw: 0.7,
        keywords,
        evidence: Vec::new(),
    }
}

#[test]
fn test_resolve_copies_catalog_fields() {
    let topics = vec![checked(
        "CONTRATTO",
        vec![RawKeywordReference::new("A"), RawKeywordReference::new("B")],
    )];
    let resolution = CatalogResolver::new()
        .resolve(topics, &catalog())
        .expect("resolved");

    let topic = &resolution.topics[0];
    assert_eq!(topic.confidence_raw, 0.7);
    assert_eq!(topic.confidence_adjusted, 0.7);
    assert_eq!(topic.keywords.len(), 2);

    let a = &topic.keywords[0];
    assert_eq!(a.term, "contratti");
    assert_eq!(a.lemma, "contratto");
    assert_eq!(a.count, 3);
    assert_eq!(a.source, CandidateSource::Subject);
    assert_eq!(a.embedding_score, 0.72);
    assert_eq!(a.composite_score, 0.8);
    assert!(resolution.warnings.is_empty());
}

#[test]
fn test_echoed_fields_reported_as_redundant() {
    let reference = RawKeywordReference {
        candidate_id: "B".to_string(),
        echoed_fields: vec!["lemma".to_string(), "embeddingscore".to_string()],
    };
    let resolution = CatalogResolver::new()
        .resolve(vec![checked("FATTURAZIONE", vec![reference])], &catalog())
        .expect("resolved");

    assert_eq!(resolution.topics[0].keywords[0].lemma, "bolletta");
    assert_eq!(resolution.warnings.len(), 2);
    assert!(
        resolution
            .warnings
            .iter()
            .all(|w| w.code == WarningCode::RedundantField)
    );
    assert_eq!(
        resolution.warnings[1].field,
        "topics[0].keywordsintext[0].embeddingscore"
    );
}

#[test]
fn test_unknown_candidate_fails_whole_resolution() {
    let topics = vec![
        checked("CONTRATTO", vec![RawKeywordReference::new("A")]),
        checked(
            "FATTURAZIONE",
            vec![RawKeywordReference::new("B"), RawKeywordReference::new("X")],
        ),
    ];
    let err = CatalogResolver::new()
        .resolve(topics, &catalog())
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::UnknownCandidate {
            label_id: "FATTURAZIONE".to_string(),
            candidate_id: "X".to_string(),
            field: "topics[1].keywordsintext[1]".to_string(),
        }
    );

    let rejection = Rejection::from(err);
    assert_eq!(rejection.code, ErrorCode::UnknownCandidate);
    assert!(!rejection.code.is_retryable());
}

#[test]
fn test_topic_without_keywords_resolves_empty() {
    let resolution = CatalogResolver::new()
        .resolve(vec![checked("UNKNOWN_TOPIC", Vec::new())], &catalog())
        .expect("resolved");
    assert!(!resolution.topics[0].has_keywords());
}
