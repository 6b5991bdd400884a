//! Expression evaluation implementation.

use crate::expression::{
    BinaryOperator, DataType, EvaluationFault, ExprRef, Expression, ExpressionError,
    ExpressionKind, ExpressionResult, Lambda, Parameter, Record, UnaryOperator, Value,
};
use std::cmp::Ordering;

/// Evaluator for expression trees under a set of parameter bindings
pub struct Interpreter<'a> {
    bindings: &'a [(Parameter, Value)],
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with parameter bindings
    pub fn new(bindings: &'a [(Parameter, Value)]) -> Self {
        Self { bindings }
    }

    /// Create an interpreter for trees that reference no parameter
    pub fn closed() -> Interpreter<'static> {
        Interpreter { bindings: &[] }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr.kind() {
            ExpressionKind::Constant(value) => Ok(value.clone()),

            ExpressionKind::Parameter(param) => self.lookup(param),

            ExpressionKind::Member { target, member } => {
                let target = self.evaluate(target)?;
                Ok(self.read_member(&target, member)?)
            }

            ExpressionKind::Call {
                method,
                receiver,
                args,
            } => {
                let values = receiver
                    .iter()
                    .chain(args.iter())
                    .map(|arg| self.evaluate(arg))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(method.invoke(&values)?)
            }

            ExpressionKind::Binary { op, left, right } => self.evaluate_binary(*op, left, right),

            ExpressionKind::Unary { op, operand } => {
                let operand = self.evaluate(operand)?;
                Ok(evaluate_unary_op(*op, operand)?)
            }

            ExpressionKind::Conditional {
                test,
                if_true,
                if_false,
            } => match self.evaluate(test)? {
                Value::Boolean(true) => self.evaluate(if_true),
                Value::Boolean(false) => self.evaluate(if_false),
                Value::Null => Err(EvaluationFault::NullReference {
                    context: "conditional test".to_string(),
                }
                .into()),
                other => Err(EvaluationFault::InvalidOperandTypes {
                    operator: "IIF".to_string(),
                    left: other.data_type(),
                    right: None,
                }
                .into()),
            },

            ExpressionKind::New { fields } => {
                let type_name = match expr.data_type() {
                    DataType::Record(name) => name.clone(),
                    other => other.to_string().into(),
                };
                let mut record = Record::new(type_name);
                for (name, value) in fields {
                    record = record.with_field(name.clone(), self.evaluate(value)?);
                }
                Ok(Value::record(record))
            }

            ExpressionKind::ListInit { items } => {
                let element_type = expr
                    .data_type()
                    .element_type()
                    .cloned()
                    .unwrap_or(DataType::Null);
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(Value::collection(element_type, values))
            }

            ExpressionKind::Lambda(_) | ExpressionKind::Other { .. } => {
                Err(ExpressionError::UnsupportedNodeKind {
                    kind: expr.kind_name().to_string(),
                })
            }
        }
    }

    fn lookup(&self, param: &Parameter) -> ExpressionResult<Value> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == param)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                EvaluationFault::UnboundParameter {
                    name: param.name().to_string(),
                }
                .into()
            })
    }

    fn read_member(&self, target: &Value, member: &str) -> Result<Value, EvaluationFault> {
        match target {
            Value::Null => Err(EvaluationFault::NullReference {
                context: format!("member access .{}", member),
            }),
            Value::Record(record) => {
                record
                    .field(member)
                    .cloned()
                    .ok_or_else(|| EvaluationFault::UnknownMember {
                        type_name: record.type_name().to_string(),
                        member: member.to_string(),
                    })
            }
            other => Err(EvaluationFault::UnknownMember {
                type_name: other.data_type().to_string(),
                member: member.to_string(),
            }),
        }
    }

    /// Evaluate a binary operation; the short-circuit forms skip the right
    /// operand when the left one decides the result
    fn evaluate_binary(
        &self,
        op: BinaryOperator,
        left: &ExprRef,
        right: &ExprRef,
    ) -> ExpressionResult<Value> {
        if op.is_short_circuit() {
            let left_val = expect_bool(op, self.evaluate(left)?)?;
            let decided = match op {
                BinaryOperator::AndAlso => !left_val,
                _ => left_val,
            };
            if decided {
                return Ok(Value::Boolean(left_val));
            }
            let right_val = expect_bool(op, self.evaluate(right)?)?;
            return Ok(Value::Boolean(right_val));
        }

        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;
        Ok(evaluate_binary_op(op, left_val, right_val)?)
    }
}

fn expect_bool(op: BinaryOperator, value: Value) -> Result<bool, EvaluationFault> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Null => Err(EvaluationFault::NullReference {
            context: format!("operand of {}", op.as_str()),
        }),
        other => Err(EvaluationFault::InvalidOperandTypes {
            operator: op.as_str().to_string(),
            left: other.data_type(),
            right: None,
        }),
    }
}

fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> EvaluationFault {
    EvaluationFault::InvalidOperandTypes {
        operator: op.as_str().to_string(),
        left: left.data_type(),
        right: Some(right.data_type()),
    }
}

/// Integer operands widened to a common width
enum IntPair {
    I32(i32, i32),
    I64(i64, i64),
}

fn int_pair(left: &Value, right: &Value) -> Option<IntPair> {
    match (left, right) {
        (Value::Int32(a), Value::Int32(b)) => Some(IntPair::I32(*a, *b)),
        (Value::Int64(a), Value::Int64(b)) => Some(IntPair::I64(*a, *b)),
        (Value::Int32(a), Value::Int64(b)) => Some(IntPair::I64(i64::from(*a), *b)),
        (Value::Int64(a), Value::Int32(b)) => Some(IntPair::I64(*a, i64::from(*b))),
        _ => None,
    }
}

fn evaluate_binary_op(
    op: BinaryOperator,
    left: Value,
    right: Value,
) -> Result<Value, EvaluationFault> {
    match op {
        BinaryOperator::Eq => return Ok(Value::Boolean(values_equal(&left, &right))),
        BinaryOperator::Ne => return Ok(Value::Boolean(!values_equal(&left, &right))),
        _ => {}
    }

    // Arithmetic and ordering on null yield null and false respectively
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return match op {
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                Ok(Value::Boolean(false))
            }
            BinaryOperator::And | BinaryOperator::Or => Err(EvaluationFault::NullReference {
                context: format!("operand of {}", op.as_str()),
            }),
            _ => Ok(Value::Null),
        };
    }

    match op {
        BinaryOperator::Add
        | BinaryOperator::Sub
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::Modulo => evaluate_arithmetic(op, &left, &right),

        BinaryOperator::Lt => compare_values(op, &left, &right, Ordering::is_lt),
        BinaryOperator::Le => compare_values(op, &left, &right, Ordering::is_le),
        BinaryOperator::Gt => compare_values(op, &left, &right, Ordering::is_gt),
        BinaryOperator::Ge => compare_values(op, &left, &right, Ordering::is_ge),

        BinaryOperator::And => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a & *b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Or => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(*a | *b)),
            _ => Err(invalid_operands(op, &left, &right)),
        },

        BinaryOperator::Eq
        | BinaryOperator::Ne
        | BinaryOperator::AndAlso
        | BinaryOperator::OrElse => unreachable!("handled before operand evaluation"),
    }
}

fn evaluate_arithmetic(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Result<Value, EvaluationFault> {
    if let (BinaryOperator::Add, Value::String(a), Value::String(b)) = (op, left, right) {
        return Ok(Value::String(format!("{}{}", a, b)));
    }

    let pair = int_pair(left, right).ok_or_else(|| invalid_operands(op, left, right))?;
    let divides = matches!(op, BinaryOperator::Div | BinaryOperator::Modulo);
    match pair {
        IntPair::I32(_, 0) | IntPair::I64(_, 0) if divides => Err(EvaluationFault::DivisionByZero),
        IntPair::I32(a, b) => Ok(Value::Int32(match op {
            BinaryOperator::Add => a.wrapping_add(b),
            BinaryOperator::Sub => a.wrapping_sub(b),
            BinaryOperator::Mul => a.wrapping_mul(b),
            BinaryOperator::Div => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        })),
        IntPair::I64(a, b) => Ok(Value::Int64(match op {
            BinaryOperator::Add => a.wrapping_add(b),
            BinaryOperator::Sub => a.wrapping_sub(b),
            BinaryOperator::Mul => a.wrapping_mul(b),
            BinaryOperator::Div => a.wrapping_div(b),
            _ => a.wrapping_rem(b),
        })),
    }
}

/// Equality with Int32/Int64 compared by numeric value
fn values_equal(left: &Value, right: &Value) -> bool {
    match int_pair(left, right) {
        Some(IntPair::I32(a, b)) => a == b,
        Some(IntPair::I64(a, b)) => a == b,
        None => left == right,
    }
}

/// Compare two values and apply a comparison function
fn compare_values<F>(
    op: BinaryOperator,
    left: &Value,
    right: &Value,
    cmp_fn: F,
) -> Result<Value, EvaluationFault>
where
    F: FnOnce(Ordering) -> bool,
{
    let ordering = match (int_pair(left, right), left, right) {
        (Some(IntPair::I32(a, b)), _, _) => a.cmp(&b),
        (Some(IntPair::I64(a, b)), _, _) => a.cmp(&b),
        (None, Value::String(a), Value::String(b)) => a.cmp(b),
        (None, Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        _ => return Err(invalid_operands(op, left, right)),
    };
    Ok(Value::Boolean(cmp_fn(ordering)))
}

fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> Result<Value, EvaluationFault> {
    match op {
        UnaryOperator::IsNull => Ok(Value::Boolean(matches!(operand, Value::Null))),
        UnaryOperator::IsNotNull => Ok(Value::Boolean(!matches!(operand, Value::Null))),

        UnaryOperator::Not => match operand {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(EvaluationFault::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left: other.data_type(),
                right: None,
            }),
        },

        UnaryOperator::Negate => match operand {
            Value::Null => Ok(Value::Null),
            Value::Int32(n) => Ok(Value::Int32(n.wrapping_neg())),
            Value::Int64(n) => Ok(Value::Int64(n.wrapping_neg())),
            other => Err(EvaluationFault::InvalidOperandTypes {
                operator: op.as_str().to_string(),
                left: other.data_type(),
                right: None,
            }),
        },
    }
}

/// Evaluate a tree that references no parameter
pub fn evaluate_closed(expr: &Expression) -> ExpressionResult<Value> {
    Interpreter::closed().evaluate(expr)
}

impl Lambda {
    /// Apply the lambda to positional arguments
    pub fn invoke(&self, args: &[Value]) -> ExpressionResult<Value> {
        if args.len() != self.arity() {
            return Err(EvaluationFault::ArgumentCount {
                method: self.to_string(),
                expected: self.arity(),
                actual: args.len(),
            }
            .into());
        }
        let bindings: Vec<(Parameter, Value)> = self
            .parameters()
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        Interpreter::new(&bindings).evaluate(self.body())
    }
}
