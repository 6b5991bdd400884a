//! Tree transformations that prepare a predicate for canonical rendering.
//!
//! - `rebinder`: identity-based parameter substitution
//! - `compose`: AND / OR composition of lambdas
//! - `purity`: allow-list of side-effect-free methods
//! - `partial_eval`: folding of parameter-independent sub-trees
//! - `collection_expander`: rewriting of local collection membership tests

pub mod collection_expander;
pub mod compose;
pub mod partial_eval;
pub mod purity;
pub mod rebinder;

pub use collection_expander::LocalCollectionExpander;
pub use compose::{and, and_also, compose, or, or_else};
pub use partial_eval::{partial_eval, Classification, PartialEvaluator};
pub use purity::PurityPolicy;
pub use rebinder::{positional_map, ParameterRebinder};
