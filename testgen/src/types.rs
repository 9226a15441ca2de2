//! Core types for the test generation framework

use crate::execution::ExecutionTrace;
use crate::selection::LoadError;
use opseq_core::Throwable;
use opseq_operation::OperationError;
use opseq_registry::RegistryError;
use opseq_sequence::{Sequence, SequenceError, SequenceParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during test generation
#[derive(Error, Debug)]
pub enum TestGenError {
    #[error("Registry construction failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid operation: {0}")]
    Operation(#[from] OperationError),
    #[error("Invalid sequence: {0}")]
    Sequence(#[from] SequenceError),
    #[error("Component file error: {0}")]
    Components(#[from] SequenceParseError),
    #[error("Selection load failed: {0}")]
    Load(#[from] LoadError),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type TestGenResult<T> = Result<T, TestGenError>;

/// Verdict of a contract checker over one executed sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Behaves as documented; kept as a regression test
    Regression,
    /// Violates a contract; kept as a failing test
    ErrorRevealing,
    /// Misuse of the library (bad arguments, timeouts); discarded
    Invalid,
    /// Nondeterministic; discarded
    Flaky,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Regression => "regression",
            Classification::ErrorRevealing => "error_revealing",
            Classification::Invalid => "invalid",
            Classification::Flaky => "flaky",
        }
    }

    /// Whether tests of this kind are emitted.
    pub fn is_kept(&self) -> bool {
        matches!(self, Classification::Regression | Classification::ErrorRevealing)
    }
}

/// A single accepted test
#[derive(Debug, Clone)]
pub struct GeneratedTest {
    /// Unique identifier, also the generated method name
    pub id: String,
    pub sequence: Sequence,
    pub trace: ExecutionTrace,
    pub classification: Classification,
}

impl GeneratedTest {
    /// The exception a regression test expects its last statement to throw.
    pub fn expected_exception(&self) -> Option<&Throwable> {
        if self.classification != Classification::Regression {
            return None;
        }
        self.trace.last().and_then(|o| o.thrown())
    }

    /// The failure an error-revealing test exposes at its last statement.
    pub fn failure(&self) -> Option<&Throwable> {
        if self.classification != Classification::ErrorRevealing {
            return None;
        }
        self.trace.last().and_then(|o| o.thrown())
    }
}

/// Counters kept by the generation loop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Candidate sequences attempted
    pub attempts: usize,
    /// Candidates actually executed
    pub executed: usize,
    /// Operations with no way to bind their inputs
    pub unbound: usize,
    /// Candidates already seen or pooled
    pub duplicates: usize,
    /// Candidates over the length limit
    pub too_long: usize,
    pub regression: usize,
    pub error_revealing: usize,
    pub invalid: usize,
    pub flaky: usize,
    /// Executions containing a timed-out statement
    pub timeouts: usize,
    /// Sequences added to the component pool
    pub promoted: usize,
}

impl GenerationStats {
    pub(crate) fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Regression => self.regression += 1,
            Classification::ErrorRevealing => self.error_revealing += 1,
            Classification::Invalid => self.invalid += 1,
            Classification::Flaky => self.flaky += 1,
        }
    }
}

/// A complete generated test suite
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub tests: Vec<GeneratedTest>,
    /// Number of operations generation drew from
    pub operation_count: usize,
    pub stats: GenerationStats,
    pub seed: u64,
}

impl TestSuite {
    pub fn regression_tests(&self) -> impl Iterator<Item = &GeneratedTest> {
        self.tests
            .iter()
            .filter(|t| t.classification == Classification::Regression)
    }

    pub fn error_revealing_tests(&self) -> impl Iterator<Item = &GeneratedTest> {
        self.tests
            .iter()
            .filter(|t| t.classification == Classification::ErrorRevealing)
    }
}
