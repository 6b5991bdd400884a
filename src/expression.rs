//! Expression tree representation.
//!
//! This module provides:
//! - Typed, immutable expression nodes shared through `Arc`
//! - Parameters with identity semantics
//! - Runtime values, local collections and records
//! - An interpreter for evaluating trees under parameter bindings
//! - A copy-on-write rewriter trait used by the transformation passes

pub mod error;
pub mod eval;
pub mod expr;
pub mod method;
pub mod operator;
pub mod rewriter;
pub mod value;

pub use error::{EvaluationFault, ExpressionError, ExpressionResult};
pub use eval::{evaluate_closed, Interpreter};
pub use expr::{ExprRef, Expression, ExpressionKind, Lambda, Parameter, ParameterId};
pub use method::{builtins, Method, NativeFn};
pub use operator::{BinaryOperator, UnaryOperator};
pub use rewriter::ExpressionRewriter;
pub use value::{Collection, DataType, Record, Value};
