//! Partial evaluation.
//!
//! Runs in two passes. [`PartialEvaluator::classify`] folds the tree bottom-up
//! into a [`Classification`] of the same shape, marking every node as closed
//! or open. The rewrite pass then walks the tree and the classification
//! together from the root: the first closed node met on each path is
//! evaluated once and replaced by a constant, and its descendants are never
//! visited.
//!
//! A node is closed when all of its children are closed and the node itself is
//! free of side effects and parameter references:
//!
//! - constants are closed
//! - parameters, nested lambdas and opaque host nodes are open
//! - calls are closed only if the method is on the [`PurityPolicy`] list
//! - member reads, operators, conditionals, record construction and
//!   collection literals are closed
//!
//! Every parameter is open, including those declared by nested lambdas.

use crate::expression::{
    evaluate_closed, ExprRef, Expression, ExpressionKind, ExpressionResult, Lambda,
};
use crate::transform::purity::PurityPolicy;
use log::{debug, trace};
use std::sync::Arc;

/// Evaluability of one node, with one entry per child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    closed: bool,
    children: Vec<Classification>,
}

impl Classification {
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn children(&self) -> &[Classification] {
        &self.children
    }

    /// Number of closed nodes with no closed ancestor
    pub fn maximal_closed_count(&self) -> usize {
        if self.closed {
            1
        } else {
            self.children
                .iter()
                .map(Classification::maximal_closed_count)
                .sum()
        }
    }
}

/// Folds parameter-independent, side-effect-free sub-trees into constants
pub struct PartialEvaluator<'a> {
    purity: &'a PurityPolicy,
    folded: usize,
}

impl<'a> PartialEvaluator<'a> {
    pub fn new(purity: &'a PurityPolicy) -> Self {
        Self { purity, folded: 0 }
    }

    /// Number of sub-trees replaced so far
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// First pass: classify every node of `expr`
    pub fn classify(&self, expr: &Expression) -> Classification {
        let children: Vec<Classification> = expr
            .children()
            .into_iter()
            .map(|child| self.classify(child))
            .collect();
        let closed = self.is_local(expr) && children.iter().all(Classification::is_closed);
        Classification { closed, children }
    }

    /// Whether the node itself, ignoring its children, may be evaluated early
    fn is_local(&self, expr: &Expression) -> bool {
        match expr.kind() {
            ExpressionKind::Constant(_) => true,
            ExpressionKind::Parameter(_)
            | ExpressionKind::Lambda(_)
            | ExpressionKind::Other { .. } => false,
            ExpressionKind::Call { method, .. } => self.purity.is_pure(method),
            ExpressionKind::Member { .. }
            | ExpressionKind::Binary { .. }
            | ExpressionKind::Unary { .. }
            | ExpressionKind::Conditional { .. }
            | ExpressionKind::New { .. }
            | ExpressionKind::ListInit { .. } => true,
        }
    }

    /// Classify then rewrite `expr`
    pub fn evaluate(&mut self, expr: &ExprRef) -> ExpressionResult<ExprRef> {
        let classification = self.classify(expr);
        self.rewrite(expr, &classification)
    }

    /// Partially evaluate a lambda's body
    pub fn evaluate_lambda(&mut self, lambda: &Lambda) -> ExpressionResult<Lambda> {
        let body = self.evaluate(lambda.body())?;
        debug!("Partial evaluation of {} folded {} sub-trees", lambda, self.folded);
        if Arc::ptr_eq(&body, lambda.body()) {
            Ok(lambda.clone())
        } else {
            Ok(lambda.with_body(body))
        }
    }

    /// Second pass: replace each maximal closed node by its value
    pub fn rewrite(
        &mut self,
        expr: &ExprRef,
        classification: &Classification,
    ) -> ExpressionResult<ExprRef> {
        if classification.closed {
            if expr.is_constant() {
                return Ok(expr.clone());
            }
            let value = evaluate_closed(expr)?;
            trace!("Folded {} into {}", expr, value);
            self.folded += 1;
            return Ok(Expression::constant_typed(value, expr.data_type().clone()));
        }

        let children = expr.children();
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(children.len());
        for (child, child_class) in children.into_iter().zip(&classification.children) {
            let new_child = self.rewrite(child, child_class)?;
            changed |= !Arc::ptr_eq(&new_child, child);
            rewritten.push(new_child);
        }

        if changed {
            Ok(Arc::new(expr.with_children(&rewritten)))
        } else {
            Ok(expr.clone())
        }
    }
}

/// Partially evaluate `lambda` under `purity`
pub fn partial_eval(lambda: &Lambda, purity: &PurityPolicy) -> ExpressionResult<Lambda> {
    PartialEvaluator::new(purity).evaluate_lambda(lambda)
}
