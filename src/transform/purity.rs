//! Side-effect policy for method calls.

use crate::expression::{builtins, Method};
use std::collections::BTreeSet;

/// Allow-list of method names known to have no observable side effect.
///
/// Only calls to listed methods may be folded ahead of time. Any other call
/// keeps its place in the tree, along with every ancestor of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurityPolicy {
    pure_methods: BTreeSet<String>,
}

impl PurityPolicy {
    /// A policy that treats every method call as side-effecting
    pub fn empty() -> Self {
        Self {
            pure_methods: BTreeSet::new(),
        }
    }

    /// Mark a method name as pure
    pub fn allow(mut self, name: impl Into<String>) -> Self {
        self.pure_methods.insert(name.into());
        self
    }

    /// Remove a method name from the allow-list
    pub fn forbid(mut self, name: &str) -> Self {
        self.pure_methods.remove(name);
        self
    }

    pub fn is_pure(&self, method: &Method) -> bool {
        self.pure_methods.contains(method.name())
    }

    /// Allowed names in sorted order
    pub fn pure_methods(&self) -> impl Iterator<Item = &str> {
        self.pure_methods.iter().map(String::as_str)
    }
}

impl Default for PurityPolicy {
    /// Every builtin method
    fn default() -> Self {
        builtins::PURE_BUILTINS
            .iter()
            .fold(Self::empty(), |policy, name| policy.allow(*name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Value;

    #[test]
    fn test_default_allows_builtins() {
        let policy = PurityPolicy::default();
        assert!(policy.is_pure(&builtins::contains()));
        assert!(policy.is_pure(&builtins::to_lowercase()));
        assert_eq!(policy.pure_methods().count(), builtins::PURE_BUILTINS.len());
    }

    #[test]
    fn test_allow_and_forbid() {
        let random = Method::new("random", 0, |_| Ok(Value::Int32(4)));
        let policy = PurityPolicy::default();
        assert!(!policy.is_pure(&random));

        let policy = policy.allow("random").forbid("len");
        assert!(policy.is_pure(&random));
        assert!(!policy.is_pure(&builtins::len()));
        assert!(!PurityPolicy::empty().is_pure(&builtins::contains()));
    }
}
