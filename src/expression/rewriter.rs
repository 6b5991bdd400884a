//! Copy-on-write tree rewriting.

use crate::expression::{ExprRef, Lambda};
use std::sync::Arc;

/// Bottom-up rewrite over an expression tree.
///
/// Implementors override [`rewrite`](Self::rewrite) for the nodes they care
/// about and call [`rewrite_children`](Self::rewrite_children) for the rest.
/// A node is only rebuilt when at least one child changed; otherwise the
/// original `Arc` is returned, so untouched sub-trees stay shared.
pub trait ExpressionRewriter {
    type Error;

    fn rewrite(&mut self, expr: &ExprRef) -> Result<ExprRef, Self::Error> {
        self.rewrite_children(expr)
    }

    fn rewrite_children(&mut self, expr: &ExprRef) -> Result<ExprRef, Self::Error> {
        let children = expr.children();
        if children.is_empty() {
            return Ok(Arc::clone(expr));
        }

        let mut changed = false;
        let mut rewritten = Vec::with_capacity(children.len());
        for child in children {
            let new_child = self.rewrite(child)?;
            changed |= !Arc::ptr_eq(&new_child, child);
            rewritten.push(new_child);
        }

        if changed {
            Ok(Arc::new(expr.with_children(&rewritten)))
        } else {
            Ok(Arc::clone(expr))
        }
    }

    /// Rewrite a lambda's body, keeping its parameter list
    fn rewrite_lambda(&mut self, lambda: &Lambda) -> Result<Lambda, Self::Error> {
        let body = self.rewrite(lambda.body())?;
        if Arc::ptr_eq(&body, lambda.body()) {
            Ok(lambda.clone())
        } else {
            Ok(lambda.with_body(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{DataType, Expression, ExpressionKind, Parameter, Value};
    use std::convert::Infallible;

    /// Replaces integer constants with their double
    struct Doubler;

    impl ExpressionRewriter for Doubler {
        type Error = Infallible;

        fn rewrite(&mut self, expr: &ExprRef) -> Result<ExprRef, Infallible> {
            match expr.kind() {
                ExpressionKind::Constant(Value::Int32(n)) => Ok(Expression::constant(n * 2)),
                _ => self.rewrite_children(expr),
            }
        }
    }

    #[test]
    fn test_unchanged_subtrees_are_shared() {
        let x = Parameter::new("x", DataType::Int32);
        let untouched = Expression::is_not_null(x.expr());
        let tree = Expression::and_also(
            untouched.clone(),
            Expression::gt(x.expr(), Expression::constant(2)),
        );

        let result = Doubler.rewrite(&tree).unwrap();
        assert_eq!(result.to_string(), "(IsNotNull(x) AndAlso (x > 4))");
        assert!(Arc::ptr_eq(result.children()[0], &untouched));
    }

    #[test]
    fn test_no_change_returns_same_node() {
        let x = Parameter::new("x", DataType::Int32);
        let tree = Expression::eq(x.expr(), x.expr());
        let result = Doubler.rewrite(&tree).unwrap();
        assert!(Arc::ptr_eq(&result, &tree));

        let lambda = Lambda::new(vec![x], tree);
        let same = Doubler.rewrite_lambda(&lambda).unwrap();
        assert!(Arc::ptr_eq(same.body(), lambda.body()));
    }
}
