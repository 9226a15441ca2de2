//! Configuration for test generation

use crate::types::{TestGenError, TestGenResult};
use opseq_core::Throwable;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a selected class or member name does not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameErrorPolicy {
    /// Fail the whole load
    #[default]
    Abort,
    /// Log and skip the name
    Warn,
}

/// Configuration for the default contract checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Report timeouts as error-revealing instead of invalid
    pub timeout_is_error: bool,
    /// Treat a NullPointerException caused by a null argument as invalid
    pub null_npe_invalid: bool,
    /// Exception classes that signal a violated precondition
    pub precondition_exceptions: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout_is_error: false,
            null_npe_invalid: true,
            precondition_exceptions: vec![
                Throwable::ILLEGAL_ARGUMENT.to_string(),
                Throwable::ILLEGAL_STATE.to_string(),
                "java.lang.UnsupportedOperationException".to_string(),
            ],
        }
    }
}

impl CheckerConfig {
    pub fn with_timeout_is_error(mut self, enabled: bool) -> Self {
        self.timeout_is_error = enabled;
        self
    }

    pub fn with_null_npe_invalid(mut self, enabled: bool) -> Self {
        self.null_npe_invalid = enabled;
        self
    }

    pub fn with_precondition_exceptions<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
        self.precondition_exceptions = classes.into_iter().map(Into::into).collect();
        self
    }
}

/// Configuration for test generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Stop after this many kept tests
    pub max_tests: usize,
    /// Stop after this many candidate sequences
    pub max_attempts: usize,
    /// Overall wall-clock limit for generation, in milliseconds
    pub time_limit_ms: u64,
    /// Wall-clock budget per statement, in milliseconds
    pub statement_budget_ms: u64,
    /// Longest sequence generation will build
    pub max_sequence_length: usize,
    /// Chance of passing null to a reference parameter (0.0-1.0)
    pub null_ratio: f64,
    /// Chance of extending one pooled sequence instead of combining several (0.0-1.0)
    pub extend_ratio: f64,
    /// Seed the pool with the default literal constants
    pub use_default_seeds: bool,
    /// Regular expressions over member signatures to leave out
    pub omit_patterns: Vec<String>,
    /// Only use public members
    pub public_only: bool,
    /// Re-execute kept sequences to detect flakiness
    pub replay_kept: bool,
    pub on_name_error: NameErrorPolicy,
    pub checker: CheckerConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_tests: 100,
            max_attempts: 2000,
            time_limit_ms: 30_000,
            statement_budget_ms: 1000,
            max_sequence_length: 20,
            null_ratio: 0.05,
            extend_ratio: 0.5,
            use_default_seeds: true,
            omit_patterns: Vec::new(),
            public_only: true,
            replay_kept: false,
            on_name_error: NameErrorPolicy::Abort,
            checker: CheckerConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_tests(mut self, count: usize) -> Self {
        self.max_tests = count;
        self
    }

    pub fn with_max_attempts(mut self, count: usize) -> Self {
        self.max_attempts = count;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = limit.as_millis() as u64;
        self
    }

    pub fn with_statement_budget(mut self, budget: Duration) -> Self {
        self.statement_budget_ms = budget.as_millis() as u64;
        self
    }

    pub fn with_max_sequence_length(mut self, len: usize) -> Self {
        self.max_sequence_length = len;
        self
    }

    pub fn with_null_ratio(mut self, ratio: f64) -> Self {
        self.null_ratio = ratio;
        self
    }

    pub fn with_extend_ratio(mut self, ratio: f64) -> Self {
        self.extend_ratio = ratio;
        self
    }

    pub fn with_default_seeds(mut self, enabled: bool) -> Self {
        self.use_default_seeds = enabled;
        self
    }

    pub fn with_omit_patterns<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.omit_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_public_only(mut self, enabled: bool) -> Self {
        self.public_only = enabled;
        self
    }

    pub fn with_replay(mut self, enabled: bool) -> Self {
        self.replay_kept = enabled;
        self
    }

    pub fn with_name_error_policy(mut self, policy: NameErrorPolicy) -> Self {
        self.on_name_error = policy;
        self
    }

    pub fn with_checker(mut self, checker: CheckerConfig) -> Self {
        self.checker = checker;
        self
    }

    /// Small, fast settings for tests
    pub fn minimal() -> Self {
        Self {
            max_tests: 10,
            max_attempts: 200,
            time_limit_ms: 5_000,
            statement_budget_ms: 200,
            max_sequence_length: 8,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> TestGenResult<Self> {
        let config: GeneratorConfig =
            serde_json::from_str(text).map_err(|e| TestGenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn statement_budget(&self) -> Duration {
        Duration::from_millis(self.statement_budget_ms)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn validate(&self) -> TestGenResult<()> {
        for (name, ratio) in [("null_ratio", self.null_ratio), ("extend_ratio", self.extend_ratio)] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(TestGenError::Config(format!("{} must be within 0.0..=1.0, got {}", name, ratio)));
            }
        }
        if self.statement_budget_ms == 0 {
            return Err(TestGenError::Config("statement_budget_ms must be positive".to_string()));
        }
        if self.max_sequence_length == 0 {
            return Err(TestGenError::Config("max_sequence_length must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_defaults_missing_fields() {
        let config = GeneratorConfig::from_json(r#"{"seed": 7, "on_name_error": "warn"}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.on_name_error, NameErrorPolicy::Warn);
        assert_eq!(config.max_tests, GeneratorConfig::default().max_tests);
        assert_eq!(config.checker, CheckerConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = GeneratorConfig::minimal()
            .with_omit_patterns(["hashCode"])
            .with_checker(CheckerConfig::default().with_timeout_is_error(true));
        assert_eq!(GeneratorConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_ratio() {
        let config = GeneratorConfig::new().with_null_ratio(1.5);
        assert!(matches!(config.validate(), Err(TestGenError::Config(_))));
        assert!(GeneratorConfig::from_json(r#"{"extend_ratio": -1.0}"#).is_err());
        assert!(GeneratorConfig::from_json("not json").is_err());
    }
}
