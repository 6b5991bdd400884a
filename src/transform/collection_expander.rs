//! Local collection expansion.
//!
//! A membership test against a constant collection renders through the
//! collection object. This pass replaces each such test with one equality per
//! element, joined by `OrElse` in enumeration order, so the tree only carries
//! the element values. Duplicates are kept and order is preserved.

use crate::expression::{
    Collection, ExprRef, Expression, ExpressionKind, ExpressionRewriter, Lambda, Value,
};
use log::{debug, trace};
use std::convert::Infallible;

/// Rewrites `collection.contains(x)` and `contains(collection, x)` over
/// constant collections into equality chains
#[derive(Debug, Default)]
pub struct LocalCollectionExpander {
    expanded: usize,
}

impl LocalCollectionExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of membership tests rewritten so far
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    pub fn expand(&mut self, expr: &ExprRef) -> ExprRef {
        match self.rewrite(expr) {
            Ok(expanded) => expanded,
            Err(never) => match never {},
        }
    }

    pub fn expand_lambda(&mut self, lambda: &Lambda) -> Lambda {
        let expanded = match self.rewrite_lambda(lambda) {
            Ok(expanded) => expanded,
            Err(never) => match never {},
        };
        debug!("Expanded {} local collection tests in {}", self.expanded, lambda);
        expanded
    }
}

impl ExpressionRewriter for LocalCollectionExpander {
    type Error = Infallible;

    fn rewrite(&mut self, expr: &ExprRef) -> Result<ExprRef, Infallible> {
        let expr = self.rewrite_children(expr)?;
        let expansion = membership_site(&expr)
            .map(|(collection, element)| equality_chain(collection, element));
        match expansion {
            Some(expanded) => {
                trace!("Expanded {} into {}", expr, expanded);
                self.expanded += 1;
                Ok(expanded)
            }
            None => Ok(expr),
        }
    }
}

/// Match a membership test whose collection operand is a constant
fn membership_site(expr: &Expression) -> Option<(&Collection, &ExprRef)> {
    let ExpressionKind::Call {
        method,
        receiver,
        args,
    } = expr.kind()
    else {
        return None;
    };
    if method.name() != "contains" || method.arity() != 2 {
        return None;
    }
    let (collection, element) = match (receiver, args.as_slice()) {
        (Some(receiver), [element]) => (receiver, element),
        (None, [collection, element]) => (collection, element),
        _ => return None,
    };
    match collection.kind() {
        ExpressionKind::Constant(Value::Collection(collection)) => Some((&**collection, element)),
        _ => None,
    }
}

fn equality_chain(collection: &Collection, element: &ExprRef) -> ExprRef {
    collection
        .items()
        .iter()
        .map(|item| {
            Expression::eq(
                element.clone(),
                Expression::constant_typed(item.clone(), collection.element_type().clone()),
            )
        })
        .reduce(Expression::or_else)
        .unwrap_or_else(|| Expression::constant(false))
}
