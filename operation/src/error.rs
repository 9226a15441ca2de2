//! Operation construction errors.

use opseq_registry::MemberKind;
use thiserror::Error;

/// Errors raised when an operation cannot be built from a member or value.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperationError {
    #[error("{member} is not a {expected:?}")]
    WrongMemberKind { member: String, expected: MemberKind },

    #[error("Inner class constructor has no enclosing instance parameter: {0}")]
    MissingEnclosingParameter(String),

    #[error("Final field cannot be assigned: {0}")]
    FinalField(String),

    #[error("Literal {value} does not fit type {type_name}")]
    LiteralTypeMismatch { type_name: String, value: String },
}

pub type OperationResult<T> = Result<T, OperationError>;
