//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `TRIAGE_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CLASSIFIER_TIMEOUT_MS, DEFAULT_EVIDENCE_FAILURE_THRESHOLD, DEFAULT_FUZZY_MARGIN,
    DEFAULT_FUZZY_THRESHOLD, DEFAULT_MAX_RETRIES, DEFAULT_TOPIC_LABELS,
};
use crate::evidence::{EvidenceConfig, EvidencePolicy};
use crate::observations::IdStrategy;
use crate::validation::ValidatorConfig;

/// Engine configuration loaded from environment variables.
///
/// Use [`EnrichConfig::from_env`] to read `TRIAGE_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichConfig {
    /// Classifier attempts in `Validating`. Default: `3`.
    pub max_retries: u32,

    /// Timeout per classifier attempt. Default: `30000`.
    pub classifier_timeout_ms: u64,

    /// Max share of `not_found` evidence before the message is rejected. Default: `0.3`.
    pub evidence_failure_threshold: f64,

    /// Minimum similarity for a fuzzy evidence match. Default: `0.85`.
    pub fuzzy_threshold: f64,

    /// Extra characters per fuzzy search window. Default: `20`.
    pub fuzzy_margin: usize,

    /// Messages processed concurrently in batch mode. Default: available parallelism.
    pub workers: usize,

    /// Closed topic taxonomy. Default: built-in labels.
    pub allowed_labels: Vec<String>,

    /// Observation id minting. Default: `random`.
    pub observation_ids: IdStrategy,

    /// Optional gazetteer lexicon (JSON) for the built-in gazetteer recognizer.
    pub gazetteer_path: Option<PathBuf>,

    /// Where the replay binary writes Prometheus text exposition. Default: unset.
    pub metrics_path: Option<PathBuf>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            classifier_timeout_ms: DEFAULT_CLASSIFIER_TIMEOUT_MS,
            evidence_failure_threshold: DEFAULT_EVIDENCE_FAILURE_THRESHOLD,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_margin: DEFAULT_FUZZY_MARGIN,
            workers: default_workers(),
            allowed_labels: DEFAULT_TOPIC_LABELS.iter().map(|s| s.to_string()).collect(),
            observation_ids: IdStrategy::default(),
            gazetteer_path: None,
            metrics_path: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl EnrichConfig {
    const ENV_MAX_RETRIES: &'static str = "TRIAGE_MAX_RETRIES";
    const ENV_CLASSIFIER_TIMEOUT_MS: &'static str = "TRIAGE_CLASSIFIER_TIMEOUT_MS";
    const ENV_EVIDENCE_FAILURE_THRESHOLD: &'static str = "TRIAGE_EVIDENCE_FAILURE_THRESHOLD";
    const ENV_FUZZY_THRESHOLD: &'static str = "TRIAGE_FUZZY_THRESHOLD";
    const ENV_FUZZY_MARGIN: &'static str = "TRIAGE_FUZZY_MARGIN";
    const ENV_WORKERS: &'static str = "TRIAGE_WORKERS";
    const ENV_ALLOWED_LABELS: &'static str = "TRIAGE_ALLOWED_LABELS";
    const ENV_OBSERVATION_IDS: &'static str = "TRIAGE_OBSERVATION_IDS";
    const ENV_GAZETTEER_PATH: &'static str = "TRIAGE_GAZETTEER_PATH";
    const ENV_METRICS_PATH: &'static str = "TRIAGE_METRICS_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_retries = Self::parse_int_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries)?;
        let classifier_timeout_ms = Self::parse_int_from_env(
            Self::ENV_CLASSIFIER_TIMEOUT_MS,
            defaults.classifier_timeout_ms,
        )?;
        let evidence_failure_threshold = Self::parse_float_from_env(
            Self::ENV_EVIDENCE_FAILURE_THRESHOLD,
            defaults.evidence_failure_threshold,
        )?;
        let fuzzy_threshold =
            Self::parse_float_from_env(Self::ENV_FUZZY_THRESHOLD, defaults.fuzzy_threshold)?;
        let fuzzy_margin = Self::parse_int_from_env(Self::ENV_FUZZY_MARGIN, defaults.fuzzy_margin)?;
        let workers = Self::parse_int_from_env(Self::ENV_WORKERS, defaults.workers)?;
        let allowed_labels =
            Self::parse_list_from_env(Self::ENV_ALLOWED_LABELS, defaults.allowed_labels);
        let observation_ids = match env::var(Self::ENV_OBSERVATION_IDS) {
            Ok(value) => value
                .parse()
                .map_err(|reason| ConfigError::InvalidIdStrategy { reason })?,
            Err(_) => defaults.observation_ids,
        };
        let gazetteer_path = Self::parse_optional_path_from_env(Self::ENV_GAZETTEER_PATH);
        let metrics_path = Self::parse_optional_path_from_env(Self::ENV_METRICS_PATH);

        Ok(Self {
            max_retries,
            classifier_timeout_ms,
            evidence_failure_threshold,
            fuzzy_threshold,
            fuzzy_margin,
            workers,
            allowed_labels,
            observation_ids,
            gazetteer_path,
            metrics_path,
        })
    }

    /// Validates thresholds, counts and paths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            (
                Self::ENV_EVIDENCE_FAILURE_THRESHOLD,
                self.evidence_failure_threshold,
            ),
            (Self::ENV_FUZZY_THRESHOLD, self.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }

        if self.max_retries == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_MAX_RETRIES,
            });
        }
        if self.classifier_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CLASSIFIER_TIMEOUT_MS,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_WORKERS,
            });
        }
        if self.allowed_labels.is_empty() {
            return Err(ConfigError::EmptyLabelSet);
        }

        if let Some(ref path) = self.gazetteer_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(parent) = self
            .metrics_path
            .as_deref()
            .and_then(|path| path.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            if !parent.is_dir() {
                return Err(ConfigError::PathNotFound {
                    path: parent.to_path_buf(),
                });
            }
        }

        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }

    pub fn evidence_config(&self) -> EvidenceConfig {
        EvidenceConfig {
            fuzzy_threshold: self.fuzzy_threshold,
            fuzzy_margin: self.fuzzy_margin,
        }
    }

    /// Validator settings for a run whose pipeline uses `dictionary_version`.
    pub fn validator_config(&self, dictionary_version: u32) -> ValidatorConfig {
        ValidatorConfig {
            evidence: self.evidence_config(),
            evidence_policy: EvidencePolicy::new(self.evidence_failure_threshold),
            expected_dictionary_version: Some(dictionary_version),
        }
    }

    fn parse_int_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::IntParseError {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_float_from_env(var_name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::FloatParseError {
                    name: var_name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_list_from_env(var_name: &str, default: Vec<String>) -> Vec<String> {
        match env::var(var_name) {
            Ok(value) => value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => default,
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
