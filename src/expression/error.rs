//! Error types for expression composition and evaluation.

use crate::expression::value::DataType;
use thiserror::Error;

/// Runtime faults raised while evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationFault {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in {operator}")]
    Overflow { operator: String },

    #[error("Null reference in {context}")]
    NullReference { context: String },

    #[error("Invalid operand types for operator {operator}: left={left}, right={right:?}")]
    InvalidOperandTypes {
        operator: String,
        left: DataType,
        right: Option<DataType>,
    },

    #[error("Type {type_name} has no member '{member}'")]
    UnknownMember { type_name: String, member: String },

    #[error("Parameter '{name}' is not bound")]
    UnboundParameter { name: String },

    #[error("Method {method} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Method {method} failed: {message}")]
    Native { method: String, message: String },
}

/// Errors surfaced by the expression pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Cannot compose lambdas with {first} and {second} parameters")]
    ArityMismatch { first: usize, second: usize },

    #[error("Parameter {position} has type {first} in the first lambda but {second} in the second")]
    ParameterTypeMismatch {
        position: usize,
        first: DataType,
        second: DataType,
    },

    #[error("Expression evaluation failed: {0}")]
    EvaluationFailure(#[from] EvaluationFault),

    #[error("Unsupported node kind: {kind}")]
    UnsupportedNodeKind { kind: String },
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
