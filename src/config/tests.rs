use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_triage_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("TRIAGE_MAX_RETRIES");
        env::remove_var("TRIAGE_CLASSIFIER_TIMEOUT_MS");
        env::remove_var("TRIAGE_EVIDENCE_FAILURE_THRESHOLD");
        env::remove_var("TRIAGE_FUZZY_THRESHOLD");
        env::remove_var("TRIAGE_FUZZY_MARGIN");
        env::remove_var("TRIAGE_WORKERS");
        env::remove_var("TRIAGE_ALLOWED_LABELS");
        env::remove_var("TRIAGE_OBSERVATION_IDS");
        env::remove_var("TRIAGE_GAZETTEER_PATH");
        env::remove_var("TRIAGE_METRICS_PATH");
    }
}

#[test]
fn test_default_config() {
    let config = EnrichConfig::default();

    assert_eq!(config.max_retries, 3);
    assert_eq!(config.classifier_timeout_ms, 30_000);
    assert_eq!(config.evidence_failure_threshold, 0.3);
    assert_eq!(config.fuzzy_threshold, 0.85);
    assert_eq!(config.fuzzy_margin, 20);
    assert!(config.workers >= 1);
    assert!(config.allowed_labels.contains(&"FATTURAZIONE".to_string()));
    assert_eq!(config.observation_ids, IdStrategy::Random);
    assert!(config.gazetteer_path.is_none());
    assert!(config.metrics_path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_triage_env();

    let config = EnrichConfig::from_env().expect("should parse with defaults");
    let defaults = EnrichConfig::default();

    assert_eq!(config, defaults);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_triage_env();

    with_env_vars(
        &[
            ("TRIAGE_MAX_RETRIES", "5"),
            ("TRIAGE_CLASSIFIER_TIMEOUT_MS", "1500"),
            ("TRIAGE_EVIDENCE_FAILURE_THRESHOLD", "0.5"),
            ("TRIAGE_FUZZY_THRESHOLD", " 0.9 "),
            ("TRIAGE_FUZZY_MARGIN", "10"),
            ("TRIAGE_WORKERS", "2"),
            ("TRIAGE_OBSERVATION_IDS", "Deterministic"),
        ],
        || {
            let config = EnrichConfig::from_env().expect("should parse");

            assert_eq!(config.max_retries, 5);
            assert_eq!(config.classifier_timeout(), Duration::from_millis(1500));
            assert_eq!(config.evidence_failure_threshold, 0.5);
            assert_eq!(config.fuzzy_threshold, 0.9);
            assert_eq!(config.fuzzy_margin, 10);
            assert_eq!(config.workers, 2);
            assert_eq!(config.observation_ids, IdStrategy::Deterministic);
        },
    );
}

#[test]
#[serial]
fn test_from_env_allowed_labels_list() {
    clear_triage_env();

    with_env_vars(
        &[("TRIAGE_ALLOWED_LABELS", "FATTURAZIONE, RECLAMO,,  ")],
        || {
            let config = EnrichConfig::from_env().expect("should parse");
            assert_eq!(config.allowed_labels, vec!["FATTURAZIONE", "RECLAMO"]);
        },
    );
}

#[test]
#[serial]
fn test_from_env_empty_labels_fails_validation() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_ALLOWED_LABELS", " , ")], || {
        let config = EnrichConfig::from_env().expect("should parse");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyLabelSet));
    });
}

#[test]
#[serial]
fn test_malformed_threshold_is_an_error() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_FUZZY_THRESHOLD", "high")], || {
        let err = EnrichConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::FloatParseError { .. }));
        assert!(err.to_string().contains("TRIAGE_FUZZY_THRESHOLD"));
        assert!(err.to_string().contains("high"));
    });
}

#[test]
#[serial]
fn test_malformed_retries_is_an_error() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_MAX_RETRIES", "-1")], || {
        let err = EnrichConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::IntParseError { .. }));
    });
}

#[test]
#[serial]
fn test_unknown_id_strategy_is_an_error() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_OBSERVATION_IDS", "sequential")], || {
        let err = EnrichConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdStrategy { .. }));
        assert!(err.to_string().contains("sequential"));
    });
}

#[test]
fn test_validate_threshold_out_of_range() {
    let config = EnrichConfig {
        evidence_failure_threshold: 1.5,
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ThresholdOutOfRange {
            name: "TRIAGE_EVIDENCE_FAILURE_THRESHOLD",
            ..
        }
    ));

    let config = EnrichConfig {
        fuzzy_threshold: -0.1,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ThresholdOutOfRange { .. })
    ));
}

#[test]
fn test_validate_zero_counts() {
    let config = EnrichConfig {
        max_retries: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue {
            name: "TRIAGE_MAX_RETRIES"
        })
    ));

    let config = EnrichConfig {
        workers: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue {
            name: "TRIAGE_WORKERS"
        })
    ));
}

#[test]
fn test_validate_nonexistent_gazetteer_path() {
    let config = EnrichConfig {
        gazetteer_path: Some(PathBuf::from("/nonexistent/gazetteer.json")),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::PathNotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/gazetteer.json"));
}

#[test]
fn test_validate_gazetteer_path_is_directory() {
    let config = EnrichConfig {
        gazetteer_path: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src")),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotAFile { .. })
    ));
}

#[test]
fn test_validator_config_carries_thresholds() {
    let config = EnrichConfig {
        evidence_failure_threshold: 0.5,
        fuzzy_threshold: 0.9,
        fuzzy_margin: 5,
        ..Default::default()
    };

    let validator = config.validator_config(7);
    assert_eq!(validator.evidence_policy.max_failure_rate, 0.5);
    assert_eq!(validator.evidence.fuzzy_threshold, 0.9);
    assert_eq!(validator.evidence.fuzzy_margin, 5);
    assert_eq!(validator.expected_dictionary_version, Some(7));
}

#[test]
fn test_validate_success_with_gazetteer_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = EnrichConfig {
        gazetteer_path: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_from_env_gazetteer_path() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_GAZETTEER_PATH", "/etc/triage/gazetteer.json")], || {
        let config = EnrichConfig::from_env().expect("should parse");
        assert_eq!(
            config.gazetteer_path,
            Some(PathBuf::from("/etc/triage/gazetteer.json"))
        );
    });
}

#[test]
#[serial]
fn test_from_env_metrics_path() {
    clear_triage_env();

    with_env_vars(&[("TRIAGE_METRICS_PATH", "metrics.prom")], || {
        let config = EnrichConfig::from_env().expect("should parse");
        assert_eq!(config.metrics_path, Some(PathBuf::from("metrics.prom")));
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_validate_metrics_path_needs_existing_directory() {
    let config = EnrichConfig {
        metrics_path: Some(PathBuf::from("/nonexistent/dir/metrics.prom")),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));

    let dir = tempfile::tempdir().expect("temp dir");
    let config = EnrichConfig {
        metrics_path: Some(dir.path().join("metrics.prom")),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}
