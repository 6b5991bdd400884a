//! Canonical string keys for lambdas.
//!
//! A key is produced in three steps, each applied exactly once:
//! 1. partial evaluation folds every parameter-independent sub-tree
//! 2. membership tests against local collections are expanded
//! 3. the reduced lambda is rendered
//!
//! The rendering contains no addresses, instance ids, capacities or hash
//! iteration order, so keys are stable across runs and machines.

use crate::expression::{ExpressionResult, Lambda};
use crate::transform::{LocalCollectionExpander, PartialEvaluator, PurityPolicy};
use log::debug;

/// Canonicalizer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalizerConfig {
    /// Methods that may be evaluated ahead of time
    pub purity: PurityPolicy,
    /// Rewrite local collection membership tests
    pub expand_local_collections: bool,
}

impl CanonicalizerConfig {
    pub fn with_purity(mut self, purity: PurityPolicy) -> Self {
        self.purity = purity;
        self
    }

    pub fn allow_pure(mut self, name: impl Into<String>) -> Self {
        self.purity = self.purity.allow(name);
        self
    }

    pub fn expand_local_collections(mut self, enabled: bool) -> Self {
        self.expand_local_collections = enabled;
        self
    }
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        Self {
            purity: PurityPolicy::default(),
            expand_local_collections: true,
        }
    }
}

/// Produces canonical keys. Holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: CanonicalizerConfig,
}

impl Canonicalizer {
    pub fn new(config: CanonicalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CanonicalizerConfig {
        &self.config
    }

    /// Run partial evaluation then collection expansion
    pub fn reduce(&self, lambda: &Lambda) -> ExpressionResult<Lambda> {
        let mut evaluator = PartialEvaluator::new(&self.config.purity);
        let reduced = evaluator.evaluate_lambda(lambda)?;
        if !self.config.expand_local_collections {
            return Ok(reduced);
        }
        Ok(LocalCollectionExpander::new().expand_lambda(&reduced))
    }

    /// Canonical key of `lambda`
    pub fn canonicalize(&self, lambda: &Lambda) -> ExpressionResult<String> {
        let key = self.reduce(lambda)?.to_string();
        debug!("Canonical key: {}", key);
        Ok(key)
    }

    /// `None` in, `None` out; otherwise the canonical key
    pub fn to_expression_string(&self, lambda: Option<&Lambda>) -> ExpressionResult<Option<String>> {
        lambda.map(|lambda| self.canonicalize(lambda)).transpose()
    }
}

/// Canonical key of `lambda` under the default configuration
pub fn to_expression_string(lambda: Option<&Lambda>) -> ExpressionResult<Option<String>> {
    Canonicalizer::default().to_expression_string(lambda)
}
