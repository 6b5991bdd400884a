//! Logical composition of lambdas.
//!
//! `and`, `and_also`, `or` and `or_else` merge two predicates into one that
//! keeps the first predicate's parameters. The second predicate's body is
//! rebound onto those parameters before the bodies are joined, so the result
//! never mentions the second predicate's own parameter objects.

use crate::expression::{
    BinaryOperator, ExprRef, Expression, ExpressionError, ExpressionResult, Lambda,
};
use crate::transform::rebinder::{positional_map, ParameterRebinder};
use log::debug;

/// Merge two lambdas with an arbitrary body combinator
pub fn compose<F>(first: &Lambda, second: &Lambda, merge: F) -> ExpressionResult<Lambda>
where
    F: FnOnce(ExprRef, ExprRef) -> ExprRef,
{
    if first.arity() != second.arity() {
        return Err(ExpressionError::ArityMismatch {
            first: first.arity(),
            second: second.arity(),
        });
    }

    for (position, (a, b)) in first
        .parameters()
        .iter()
        .zip(second.parameters())
        .enumerate()
    {
        if a.data_type() != b.data_type() {
            return Err(ExpressionError::ParameterTypeMismatch {
                position,
                first: a.data_type().clone(),
                second: b.data_type().clone(),
            });
        }
    }

    let map = positional_map(second.parameters(), first.parameters());
    let second_body = ParameterRebinder::replace_parameters(&map, second.body());

    Ok(first.with_body(merge(first.body().clone(), second_body)))
}

fn compose_with(first: &Lambda, second: &Lambda, op: BinaryOperator) -> ExpressionResult<Lambda> {
    debug!("Composing {} with {} using {}", first, second, op.as_str());
    compose(first, second, |left, right| Expression::binary(op, left, right))
}

/// Non-short-circuit logical AND of two predicates
pub fn and(first: &Lambda, second: &Lambda) -> ExpressionResult<Lambda> {
    compose_with(first, second, BinaryOperator::And)
}

/// Short-circuit logical AND of two predicates
pub fn and_also(first: &Lambda, second: &Lambda) -> ExpressionResult<Lambda> {
    compose_with(first, second, BinaryOperator::AndAlso)
}

/// Non-short-circuit logical OR of two predicates
pub fn or(first: &Lambda, second: &Lambda) -> ExpressionResult<Lambda> {
    compose_with(first, second, BinaryOperator::Or)
}

/// Short-circuit logical OR of two predicates
pub fn or_else(first: &Lambda, second: &Lambda) -> ExpressionResult<Lambda> {
    compose_with(first, second, BinaryOperator::OrElse)
}

impl Lambda {
    pub fn and(&self, other: &Lambda) -> ExpressionResult<Lambda> {
        and(self, other)
    }

    pub fn and_also(&self, other: &Lambda) -> ExpressionResult<Lambda> {
        and_also(self, other)
    }

    pub fn or(&self, other: &Lambda) -> ExpressionResult<Lambda> {
        or(self, other)
    }

    pub fn or_else(&self, other: &Lambda) -> ExpressionResult<Lambda> {
        or_else(self, other)
    }
}
