//! Parameter substitution.

use crate::expression::{ExprRef, Expression, ExpressionKind, ExpressionRewriter, Lambda, Parameter};
use std::collections::HashMap;
use std::convert::Infallible;

/// Replaces every reference to a mapped parameter with its target.
///
/// Parameters are matched by identity, never by name. Nested lambdas that
/// declare a mapped parameter have their declaration renamed as well, so the
/// output never refers to a parameter from the source side of the map.
pub struct ParameterRebinder<'a> {
    map: &'a HashMap<Parameter, Parameter>,
}

impl<'a> ParameterRebinder<'a> {
    pub fn new(map: &'a HashMap<Parameter, Parameter>) -> Self {
        Self { map }
    }

    /// Rewrite `expr` under `map`
    pub fn replace_parameters(map: &HashMap<Parameter, Parameter>, expr: &ExprRef) -> ExprRef {
        match ParameterRebinder::new(map).rewrite(expr) {
            Ok(rebound) => rebound,
            Err(never) => match never {},
        }
    }

    fn rebind_lambda(&mut self, lambda: &Lambda) -> Option<Lambda> {
        let renamed = lambda.parameters().iter().any(|p| self.map.contains_key(p));
        let body = match self.rewrite(lambda.body()) {
            Ok(body) => body,
            Err(never) => match never {},
        };
        if !renamed && ExprRef::ptr_eq(&body, lambda.body()) {
            return None;
        }
        let parameters = lambda
            .parameters()
            .iter()
            .map(|p| self.map.get(p).unwrap_or(p).clone())
            .collect();
        Some(Lambda::new(parameters, body))
    }
}

impl ExpressionRewriter for ParameterRebinder<'_> {
    type Error = Infallible;

    fn rewrite(&mut self, expr: &ExprRef) -> Result<ExprRef, Infallible> {
        match expr.kind() {
            ExpressionKind::Parameter(param) => Ok(match self.map.get(param) {
                Some(replacement) => Expression::parameter(replacement),
                None => expr.clone(),
            }),
            ExpressionKind::Lambda(lambda) => Ok(match self.rebind_lambda(lambda) {
                Some(rebound) => Expression::lambda(rebound),
                None => expr.clone(),
            }),
            _ => self.rewrite_children(expr),
        }
    }
}

/// Map each parameter of `from` onto the parameter at the same position in `to`
pub fn positional_map(from: &[Parameter], to: &[Parameter]) -> HashMap<Parameter, Parameter> {
    from.iter().cloned().zip(to.iter().cloned()).collect()
}
