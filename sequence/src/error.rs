//! Sequence construction errors.

use thiserror::Error;

/// Errors raised when statements cannot be composed into a sequence.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequenceError {
    #[error("{operation} takes {expected} inputs, got {actual}")]
    ArityMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("Statement {statement} refers to v{input}, which is not declared before it")]
    ForwardReference { statement: usize, input: usize },

    #[error("Statement {statement} uses v{input}, which has no value")]
    VoidInput { statement: usize, input: usize },

    #[error("Statement {statement} input {position}: expected {expected}, found {actual}")]
    TypeMismatch {
        statement: usize,
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type SequenceResult<T> = Result<T, SequenceError>;
