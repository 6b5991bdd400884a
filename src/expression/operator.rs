//! Operator definitions for expressions.

use crate::expression::value::DataType;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Modulo,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical, both operands always evaluated
    And,
    Or,

    // Logical, short-circuiting
    AndAlso,
    OrElse,
}

impl BinaryOperator {
    /// Get the output type of this operator given input types
    pub fn output_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Modulo => match (left, right) {
                (DataType::Int32, DataType::Int32) => Some(DataType::Int32),
                (DataType::Int64, DataType::Int64)
                | (DataType::Int32, DataType::Int64)
                | (DataType::Int64, DataType::Int32) => Some(DataType::Int64),
                (DataType::Varchar, DataType::Varchar) if *self == BinaryOperator::Add => {
                    Some(DataType::Varchar)
                }
                _ => None,
            },

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => Some(DataType::Boolean),

            BinaryOperator::And
            | BinaryOperator::Or
            | BinaryOperator::AndAlso
            | BinaryOperator::OrElse => match (left, right) {
                (DataType::Boolean, DataType::Boolean) => Some(DataType::Boolean),
                _ => None,
            },
        }
    }

    /// Whether the right operand is only evaluated when needed
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, BinaryOperator::AndAlso | BinaryOperator::OrElse)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "And",
            BinaryOperator::Or => "Or",
            BinaryOperator::AndAlso => "AndAlso",
            BinaryOperator::OrElse => "OrElse",
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Negate,
    IsNull,
    IsNotNull,
}

impl UnaryOperator {
    /// Get the output type of this operator given input type
    pub fn output_type(&self, operand: &DataType) -> Option<DataType> {
        match self {
            UnaryOperator::Not => match operand {
                DataType::Boolean => Some(DataType::Boolean),
                _ => None,
            },

            UnaryOperator::IsNull | UnaryOperator::IsNotNull => Some(DataType::Boolean),

            UnaryOperator::Negate => match operand {
                DataType::Int32 | DataType::Int64 => Some(operand.clone()),
                _ => None,
            },
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "Not",
            UnaryOperator::Negate => "-",
            UnaryOperator::IsNull => "IsNull",
            UnaryOperator::IsNotNull => "IsNotNull",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_output_types() {
        assert_eq!(
            BinaryOperator::Add.output_type(&DataType::Int32, &DataType::Int32),
            Some(DataType::Int32)
        );
        assert_eq!(
            BinaryOperator::Mul.output_type(&DataType::Int32, &DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(
            BinaryOperator::Add.output_type(&DataType::Varchar, &DataType::Varchar),
            Some(DataType::Varchar)
        );
        assert_eq!(
            BinaryOperator::Sub.output_type(&DataType::Varchar, &DataType::Varchar),
            None
        );

        assert_eq!(
            BinaryOperator::Eq.output_type(&DataType::Int32, &DataType::Varchar),
            Some(DataType::Boolean)
        );

        assert_eq!(
            BinaryOperator::OrElse.output_type(&DataType::Boolean, &DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(
            BinaryOperator::And.output_type(&DataType::Int32, &DataType::Boolean),
            None
        );
    }

    #[test]
    fn test_short_circuit() {
        assert!(BinaryOperator::AndAlso.is_short_circuit());
        assert!(BinaryOperator::OrElse.is_short_circuit());
        assert!(!BinaryOperator::And.is_short_circuit());
        assert!(!BinaryOperator::Or.is_short_circuit());
    }

    #[test]
    fn test_unary_operator_output_types() {
        assert_eq!(
            UnaryOperator::Not.output_type(&DataType::Boolean),
            Some(DataType::Boolean)
        );
        assert_eq!(UnaryOperator::Not.output_type(&DataType::Int32), None);
        assert_eq!(
            UnaryOperator::IsNull.output_type(&DataType::Varchar),
            Some(DataType::Boolean)
        );
        assert_eq!(
            UnaryOperator::Negate.output_type(&DataType::Int64),
            Some(DataType::Int64)
        );
        assert_eq!(UnaryOperator::Negate.output_type(&DataType::Varchar), None);
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::Add.as_str(), "+");
        assert_eq!(BinaryOperator::Eq.as_str(), "==");
        assert_eq!(BinaryOperator::AndAlso.as_str(), "AndAlso");
        assert_eq!(UnaryOperator::Not.as_str(), "Not");
        assert_eq!(UnaryOperator::IsNotNull.as_str(), "IsNotNull");
    }
}
