pub mod canonical;
pub mod expression;
pub mod transform;

pub use canonical::{to_expression_string, Canonicalizer, CanonicalizerConfig};
