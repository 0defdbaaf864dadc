use std::time::{Duration, Instant};

use super::*;
use crate::hashing::hash_canonical_text;
use crate::metrics::PipelineMetrics;
use crate::model::{EvidenceItem, Span, Verification, WarningCode};

const TEXT: &str = "Buongiorno,\nVolevo confermare che i dati sono corretti.\nCordiali saluti, Mario";
const QUOTE: &str = "Volevo confermare che i dati sono corretti";

fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

fn item(verification: Verification) -> EvidenceItem {
    EvidenceItem {
        quote: "q".to_string(),
        span_original: None,
        span_computed: None,
        verification,
        similarity: 0.0,
        text_hash: String::new(),
    }
}

#[test]
fn test_exact_match_span_bounds_quote() {
    let verifier = EvidenceVerifier::new();
    let result = verifier.verify(&[RawEvidence::new(QUOTE)], TEXT);

    assert_eq!(result.items.len(), 1);
    let ev = &result.items[0];
    assert_eq!(ev.verification, Verification::Exact);
    assert_eq!(ev.span_computed, Some(Span::new(12, 54)));
    assert_eq!(ev.similarity, 1.0);

    let extracted: String = TEXT.chars().skip(12).take(42).collect();
    assert_eq!(extracted, QUOTE);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_exact_match_uses_char_offsets() {
    let text = "Perché è così: il contratto scade";
    let result = EvidenceVerifier::new().verify(&[RawEvidence::new("il contratto")], text);
    assert_eq!(result.items[0].span_computed, Some(Span::new(15, 27)));
}

#[test]
fn test_fuzzy_match_with_extra_spaces() {
    let quote = "Volevo  confermare che i  dati sono corretti";
    let result = EvidenceVerifier::new().verify(&[RawEvidence::new(quote)], TEXT);

    let ev = &result.items[0];
    assert_eq!(ev.verification, Verification::Fuzzy);
    assert!(ev.similarity >= 0.85, "similarity {}", ev.similarity);
    assert_eq!(ev.span_computed, Some(Span::new(12, 54)));
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::EvidenceFuzzyMatch)
    );
}

#[test]
fn test_absent_quote_not_found() {
    let quote = "Il pacco non risulta ancora consegnato al magazzino";
    let result = EvidenceVerifier::new().verify(&[RawEvidence::new(quote)], TEXT);

    let ev = &result.items[0];
    assert_eq!(ev.verification, Verification::NotFound);
    assert_eq!(ev.span_computed, None);
    assert_eq!(result.warnings[0].code, WarningCode::EvidenceNotVerifiable);
    assert_eq!(result.warnings[0].field, "evidence[0].quote");
}

#[test]
fn test_empty_quote_and_empty_text_not_found() {
    let verifier = EvidenceVerifier::new();
    assert_eq!(
        verifier.verify(&[RawEvidence::new("")], TEXT).items[0].verification,
        Verification::NotFound
    );
    assert_eq!(
        verifier.verify(&[RawEvidence::new(QUOTE)], "").items[0].verification,
        Verification::NotFound
    );
}

#[test]
fn test_strict_threshold_rejects_fuzzy() {
    let verifier = EvidenceVerifier::with_config(EvidenceConfig {
        fuzzy_threshold: 0.999,
        ..Default::default()
    });
    let quote = "Volevo  confermare che i  dati sono corretti";
    let ev = &verifier.verify(&[RawEvidence::new(quote)], TEXT).items[0];
    assert_eq!(ev.verification, Verification::NotFound);
    assert_eq!(ev.span_computed, None);
    assert!(ev.similarity < 0.999);
}

#[test]
fn test_inserted_negation_still_matches_fuzzily() {
    // The score is measured on the matched region, so four inserted characters cost
    // 2·42 / (46 + 42) rather than a penalty on the whole window.
    let quote = "Volevo confermare che i dati NON sono corretti";
    let ev = &EvidenceVerifier::new()
        .verify(&[RawEvidence::new(quote)], TEXT)
        .items[0];

    assert_eq!(ev.verification, Verification::Fuzzy);
    assert!((ev.similarity - 84.0 / 88.0).abs() < 1e-9, "similarity {}", ev.similarity);
    assert_eq!(ev.span_computed, Some(Span::new(12, 54)));
}

#[test]
fn test_absent_quotes_in_long_text_stay_cheap() {
    let paragraph = "Gentile servizio clienti, vi scrivo in merito alla fattura numero 4821 del mese \
        scorso. L'importo addebitato non corrisponde al contratto sottoscritto e chiedo una \
        verifica urgente. ";
    let text = paragraph.repeat(60);
    assert!(text.chars().count() > 10_000);

    let evidence = vec![
        RawEvidence::new(
            "Il corriere ha lasciato il pacco danneggiato davanti al cancello senza suonare, e \
             la scatola conteneva due bottiglie rotte. Chiedo la sostituzione della merce e il \
             rimborso delle spese di spedizione.",
        ),
        RawEvidence::new(
            "Da tre giorni il router si spegne ogni sera verso le otto e la linea internet non \
             torna fino al mattino successivo; ho gia riavviato tutto e cambiato presa senza \
             nessun risultato concreto.",
        ),
        RawEvidence::new(
            "Vorrei disdire l'abbonamento alla palestra a partire dal prossimo mese, visto che \
             mi trasferisco in un'altra citta per lavoro e non potro piu frequentare i vostri \
             corsi serali di nuoto.",
        ),
    ];

    let started = Instant::now();
    let result = EvidenceVerifier::new().verify(&evidence, &text);
    let elapsed = started.elapsed();

    assert!(
        result
            .items
            .iter()
            .all(|ev| ev.verification == Verification::NotFound)
    );
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
}

#[test]
fn test_fuzzy_match_found_in_long_text() {
    let filler = "Gentile servizio clienti, vi scrivo per una verifica. ".repeat(40);
    let text = format!("{filler}Volevo confermare che i dati sono corretti.{filler}");
    let quote = "Volevo  confermare che i  dati sono corretti";

    let ev = &EvidenceVerifier::new()
        .verify(&[RawEvidence::new(quote)], &text)
        .items[0];
    let start = filler.chars().count();

    assert_eq!(ev.verification, Verification::Fuzzy);
    assert_eq!(ev.span_computed, Some(Span::new(start, start + 42)));
}

#[test]
fn test_verifier_counts_span_status() {
    let metrics = PipelineMetrics::new().unwrap();
    let verifier = EvidenceVerifier::new().with_metrics(metrics.clone());
    let evidence = vec![
        RawEvidence::new(QUOTE),
        RawEvidence::new("Volevo  confermare che i  dati sono corretti"),
        RawEvidence::new("Il pacco non risulta ancora consegnato al magazzino"),
        RawEvidence::new("Cordiali saluti"),
    ];

    verifier.verify(&evidence, TEXT);

    assert_eq!(metrics.span_status(Verification::Exact), 2);
    assert_eq!(metrics.span_status(Verification::Fuzzy), 1);
    assert_eq!(metrics.span_status(Verification::NotFound), 1);
}

#[test]
fn test_supplied_span_retained_but_not_used() {
    let wrong = RawEvidence::with_span(QUOTE, 0, 42);
    let result = EvidenceVerifier::new().verify(&[wrong], TEXT);

    let ev = &result.items[0];
    assert_eq!(ev.span_original, Some(Span::new(0, 42)));
    assert_eq!(ev.span_computed, Some(Span::new(12, 54)));
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code, WarningCode::SpanMismatch);
    assert_eq!(result.warnings[0].field, "evidence[0].span");
}

#[test]
fn test_supplied_span_consistent() {
    let result = EvidenceVerifier::new().verify(&[RawEvidence::with_span(QUOTE, 12, 54)], TEXT);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_supplied_span_out_of_bounds() {
    let result = EvidenceVerifier::new().verify(&[RawEvidence::with_span(QUOTE, 50, 500)], TEXT);
    assert_eq!(result.warnings[0].code, WarningCode::SpanOutOfBounds);
}

#[test]
fn test_items_keep_input_order_and_text_hash() {
    let evidence = vec![
        RawEvidence::new("assente del tutto dal testo originale"),
        RawEvidence::new("Cordiali saluti"),
    ];
    let result = EvidenceVerifier::new().verify(&evidence, TEXT);

    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].verification, Verification::NotFound);
    assert_eq!(result.items[1].verification, Verification::Exact);
    let hash = hash_canonical_text(TEXT);
    assert!(result.items.iter().all(|ev| ev.text_hash == hash));
}

#[test]
fn test_verify_is_deterministic() {
    let evidence = vec![
        RawEvidence::new("Volevo  confermare che i  dati sono corretti"),
        RawEvidence::new("saluti Mario"),
    ];
    let verifier = EvidenceVerifier::new();
    assert_eq!(verifier.verify(&evidence, TEXT), verifier.verify(&evidence, TEXT));
}

#[test]
fn test_matching_blocks() {
    let a = chars("abxcd");
    let b = chars("abcd");
    let blocks = Matcher::new().matching_blocks(&a, &b);
    let total: usize = blocks.iter().map(|b| b.len).sum();
    assert_eq!(total, 4);
    assert_eq!(
        blocks[0],
        MatchBlock {
            a_start: 0,
            b_start: 0,
            len: 2
        }
    );
}

#[test]
fn test_longest_match_prefers_earliest() {
    let a = chars("ab");
    let b = chars("abab");
    let block = Matcher::new().longest_match(&a, &b, (0, 2), (0, 4));
    assert_eq!(block.b_start, 0);
    assert_eq!(block.len, 2);
}

#[test]
fn test_align_ignores_window_slack() {
    let quote = chars("dati corretti");
    let window = chars("dati corretti, e poi ancora molto altro testo");
    let found = Matcher::new().align(&quote, &window).expect("match");
    assert_eq!(found.similarity, 1.0);
    assert_eq!((found.region_start, found.region_end), (0, 13));
}

#[test]
fn test_lcs_len() {
    assert_eq!(LcsBound::new(&chars("abcbdab")).lcs_len(&chars("bdcaba")), 4);
    assert_eq!(LcsBound::new(&chars("abc")).lcs_len(&chars("xyz")), 0);
    assert_eq!(LcsBound::new(&chars("abc")).lcs_len(&chars("")), 0);
}

#[test]
fn test_lcs_len_spans_several_words() {
    let a = chars(&"ab".repeat(50));
    let b = chars(&"ba".repeat(50));
    let mut bound = LcsBound::new(&a);
    assert_eq!(bound.lcs_len(&b), 99);
    assert_eq!(bound.lcs_len(&a), 100);
}

#[test]
fn test_ceiling_never_below_alignment() {
    let quote = chars("Volevo  confermare che i  dati sono corretti");
    let text = chars(TEXT);
    let mut bound = LcsBound::new(&quote);
    let mut matcher = Matcher::new();

    for start in 0..text.len() {
        let end = (start + quote.len() + 20).min(text.len());
        let window = &text[start..end];
        let ceiling = bound.ceiling(window);
        if let Some(found) = matcher.align(&quote, window) {
            assert!(
                ceiling >= found.similarity,
                "window {start}: ceiling {ceiling} < {}",
                found.similarity
            );
        }
    }
}

#[test]
fn test_align_no_common_chars() {
    assert!(Matcher::new().align(&chars("xyz"), &chars("abc")).is_none());
}

#[test]
fn test_policy_passes_without_evidence() {
    let outcome = EvidencePolicy::default().evaluate(std::iter::empty());
    assert!(outcome.passed);
    assert_eq!(outcome.total, 0);
}

#[test]
fn test_policy_threshold() {
    let policy = EvidencePolicy::default();

    let within = [
        item(Verification::Exact),
        item(Verification::Fuzzy),
        item(Verification::Exact),
        item(Verification::NotFound),
    ];
    let outcome = policy.evaluate(within.iter());
    assert!(outcome.passed);
    assert_eq!(outcome.failure_rate, 0.25);

    let beyond = [
        item(Verification::Exact),
        item(Verification::NotFound),
        item(Verification::Exact),
    ];
    let outcome = policy.evaluate(beyond.iter());
    assert!(!outcome.passed);
    assert_eq!(outcome.not_found, 1);
}

#[test]
fn test_policy_custom_threshold() {
    let items = [item(Verification::NotFound), item(Verification::Exact)];
    assert!(EvidencePolicy::new(0.5).evaluate(items.iter()).passed);
    assert!(!EvidencePolicy::new(0.4).evaluate(items.iter()).passed);
}
