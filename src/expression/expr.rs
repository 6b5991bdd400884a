//! Expression tree definitions.
//!
//! Nodes are immutable and shared through [`ExprRef`]. Transformations build
//! new nodes only along the path that changed and reuse every untouched
//! sub-tree, so a tree may be handed to several threads at once.

use crate::expression::method::Method;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::value::{DataType, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to an expression node
pub type ExprRef = Arc<Expression>;

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// Interned identity of a parameter declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(u64);

/// A lambda parameter.
///
/// Equality and hashing use the interned id only: two parameters declared
/// separately are different even if they share a name and a type.
#[derive(Debug, Clone)]
pub struct Parameter {
    id: ParameterId,
    name: Arc<str>,
    data_type: DataType,
}

impl Parameter {
    /// Declare a new parameter with a fresh identity
    pub fn new(name: impl Into<Arc<str>>, data_type: DataType) -> Self {
        Self {
            id: ParameterId(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            data_type,
        }
    }

    pub fn id(&self) -> ParameterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Reference to this parameter as an expression node
    pub fn expr(&self) -> ExprRef {
        Expression::parameter(self)
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A parameter list and a body
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    parameters: Vec<Parameter>,
    body: ExprRef,
}

impl Lambda {
    pub fn new(parameters: Vec<Parameter>, body: ExprRef) -> Self {
        Self { parameters, body }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn body(&self) -> &ExprRef {
        &self.body
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn return_type(&self) -> &DataType {
        self.body.data_type()
    }

    /// Same parameters, different body
    pub fn with_body(&self, body: ExprRef) -> Self {
        Self {
            parameters: self.parameters.clone(),
            body,
        }
    }

    pub fn data_type(&self) -> DataType {
        DataType::Function {
            params: self
                .parameters
                .iter()
                .map(|p| p.data_type().clone())
                .collect(),
            ret: Box::new(self.return_type().clone()),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parameters.as_slice() {
            [single] => write!(f, "{}", single.name())?,
            params => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.name())?;
                }
                write!(f, ")")?;
            }
        }
        write!(f, " => {}", self.body)
    }
}

/// Structural kind of an expression node
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// Constant value
    Constant(Value),

    /// Reference to a lambda parameter
    Parameter(Parameter),

    /// Field read on a record
    Member { target: ExprRef, member: Arc<str> },

    /// Method call; an instance call passes its receiver first
    Call {
        method: Method,
        receiver: Option<ExprRef>,
        args: Vec<ExprRef>,
    },

    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: ExprRef,
        right: ExprRef,
    },

    /// Unary operation
    Unary { op: UnaryOperator, operand: ExprRef },

    /// `test ? if_true : if_false`
    Conditional {
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
    },

    /// Nested lambda
    Lambda(Lambda),

    /// Record construction with named fields, in declaration order
    New { fields: Vec<(Arc<str>, ExprRef)> },

    /// Collection literal
    ListInit { items: Vec<ExprRef> },

    /// Host node with no dedicated kind
    Other {
        label: Arc<str>,
        operands: Vec<ExprRef>,
    },
}

/// Expression tree node: a kind and its static result type
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    kind: ExpressionKind,
    data_type: DataType,
}

impl Expression {
    pub fn new(kind: ExpressionKind, data_type: DataType) -> Self {
        Self { kind, data_type }
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Short name of the node kind, used in diagnostics
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            ExpressionKind::Constant(_) => "Constant",
            ExpressionKind::Parameter(_) => "Parameter",
            ExpressionKind::Member { .. } => "MemberAccess",
            ExpressionKind::Call { .. } => "Call",
            ExpressionKind::Binary { .. } => "Binary",
            ExpressionKind::Unary { .. } => "Unary",
            ExpressionKind::Conditional { .. } => "Conditional",
            ExpressionKind::Lambda(_) => "Lambda",
            ExpressionKind::New { .. } => "New",
            ExpressionKind::ListInit { .. } => "ListInit",
            ExpressionKind::Other { label, .. } => label.as_ref(),
        }
    }

    /// Create a constant typed after its value
    pub fn constant(value: impl Into<Value>) -> ExprRef {
        let value = value.into();
        let data_type = value.data_type();
        Self::constant_typed(value, data_type)
    }

    /// Create a constant with an explicit static type
    pub fn constant_typed(value: Value, data_type: DataType) -> ExprRef {
        Arc::new(Self::new(ExpressionKind::Constant(value), data_type))
    }

    /// Create a parameter reference
    pub fn parameter(param: &Parameter) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::Parameter(param.clone()),
            param.data_type().clone(),
        ))
    }

    /// Create a field read
    pub fn member(target: ExprRef, member: impl Into<Arc<str>>, data_type: DataType) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::Member {
                target,
                member: member.into(),
            },
            data_type,
        ))
    }

    /// Create an instance call `receiver.method(args)`
    pub fn call_method(
        receiver: ExprRef,
        method: Method,
        args: Vec<ExprRef>,
        data_type: DataType,
    ) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::Call {
                method,
                receiver: Some(receiver),
                args,
            },
            data_type,
        ))
    }

    /// Create a static call `method(args)`
    pub fn call_static(method: Method, args: Vec<ExprRef>, data_type: DataType) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::Call {
                method,
                receiver: None,
                args,
            },
            data_type,
        ))
    }

    /// Create a binary operation expression
    pub fn binary(op: BinaryOperator, left: ExprRef, right: ExprRef) -> ExprRef {
        let data_type = op
            .output_type(left.data_type(), right.data_type())
            .unwrap_or_else(|| left.data_type().clone());
        Arc::new(Self::new(
            ExpressionKind::Binary { op, left, right },
            data_type,
        ))
    }

    pub fn add(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Add, left, right)
    }

    pub fn sub(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Sub, left, right)
    }

    pub fn mul(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Mul, left, right)
    }

    pub fn div(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Div, left, right)
    }

    pub fn modulo(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Modulo, left, right)
    }

    pub fn eq(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Ge, left, right)
    }

    pub fn and(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn and_also(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::AndAlso, left, right)
    }

    pub fn or(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::Or, left, right)
    }

    pub fn or_else(left: ExprRef, right: ExprRef) -> ExprRef {
        Self::binary(BinaryOperator::OrElse, left, right)
    }

    /// Create a unary operation expression
    pub fn unary(op: UnaryOperator, operand: ExprRef) -> ExprRef {
        let data_type = op
            .output_type(operand.data_type())
            .unwrap_or_else(|| operand.data_type().clone());
        Arc::new(Self::new(ExpressionKind::Unary { op, operand }, data_type))
    }

    pub fn not(operand: ExprRef) -> ExprRef {
        Self::unary(UnaryOperator::Not, operand)
    }

    pub fn negate(operand: ExprRef) -> ExprRef {
        Self::unary(UnaryOperator::Negate, operand)
    }

    pub fn is_null(operand: ExprRef) -> ExprRef {
        Self::unary(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: ExprRef) -> ExprRef {
        Self::unary(UnaryOperator::IsNotNull, operand)
    }

    /// Create a conditional typed after its `if_true` branch
    pub fn conditional(test: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
        let data_type = if_true.data_type().clone();
        Arc::new(Self::new(
            ExpressionKind::Conditional {
                test,
                if_true,
                if_false,
            },
            data_type,
        ))
    }

    /// Embed a lambda as a node
    pub fn lambda(lambda: Lambda) -> ExprRef {
        let data_type = lambda.data_type();
        Arc::new(Self::new(ExpressionKind::Lambda(lambda), data_type))
    }

    /// Create a record construction
    pub fn new_record(
        type_name: impl Into<Arc<str>>,
        fields: Vec<(Arc<str>, ExprRef)>,
    ) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::New { fields },
            DataType::Record(type_name.into()),
        ))
    }

    /// Create a collection literal
    pub fn list_init(element_type: DataType, items: Vec<ExprRef>) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::ListInit { items },
            DataType::list(element_type),
        ))
    }

    /// Create an opaque host node
    pub fn other(label: impl Into<Arc<str>>, operands: Vec<ExprRef>, data_type: DataType) -> ExprRef {
        Arc::new(Self::new(
            ExpressionKind::Other {
                label: label.into(),
                operands,
            },
            data_type,
        ))
    }

    /// Check if this node is a constant
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, ExpressionKind::Constant(_))
    }

    /// Direct children, in evaluation order
    pub fn children(&self) -> Vec<&ExprRef> {
        match &self.kind {
            ExpressionKind::Constant(_) | ExpressionKind::Parameter(_) => Vec::new(),
            ExpressionKind::Member { target, .. } => vec![target],
            ExpressionKind::Call { receiver, args, .. } => {
                receiver.iter().chain(args.iter()).collect()
            }
            ExpressionKind::Binary { left, right, .. } => vec![left, right],
            ExpressionKind::Unary { operand, .. } => vec![operand],
            ExpressionKind::Conditional {
                test,
                if_true,
                if_false,
            } => vec![test, if_true, if_false],
            ExpressionKind::Lambda(lambda) => vec![lambda.body()],
            ExpressionKind::New { fields } => fields.iter().map(|(_, value)| value).collect(),
            ExpressionKind::ListInit { items } => items.iter().collect(),
            ExpressionKind::Other { operands, .. } => operands.iter().collect(),
        }
    }

    /// Rebuild this node with replacement children, keeping kind and type.
    ///
    /// # Panics
    ///
    /// Panics if `children` does not have one entry per existing child.
    pub fn with_children(&self, children: &[ExprRef]) -> Expression {
        assert_eq!(
            children.len(),
            self.children().len(),
            "child count mismatch rebuilding {}",
            self.kind_name()
        );

        let kind = match &self.kind {
            ExpressionKind::Constant(_) | ExpressionKind::Parameter(_) => self.kind.clone(),
            ExpressionKind::Member { member, .. } => ExpressionKind::Member {
                target: children[0].clone(),
                member: member.clone(),
            },
            ExpressionKind::Call {
                method, receiver, ..
            } => {
                let offset = usize::from(receiver.is_some());
                ExpressionKind::Call {
                    method: method.clone(),
                    receiver: receiver.as_ref().map(|_| children[0].clone()),
                    args: children[offset..].to_vec(),
                }
            }
            ExpressionKind::Binary { op, .. } => ExpressionKind::Binary {
                op: *op,
                left: children[0].clone(),
                right: children[1].clone(),
            },
            ExpressionKind::Unary { op, .. } => ExpressionKind::Unary {
                op: *op,
                operand: children[0].clone(),
            },
            ExpressionKind::Conditional { .. } => ExpressionKind::Conditional {
                test: children[0].clone(),
                if_true: children[1].clone(),
                if_false: children[2].clone(),
            },
            ExpressionKind::Lambda(lambda) => {
                ExpressionKind::Lambda(lambda.with_body(children[0].clone()))
            }
            ExpressionKind::New { fields } => ExpressionKind::New {
                fields: fields
                    .iter()
                    .zip(children)
                    .map(|((name, _), value)| (name.clone(), value.clone()))
                    .collect(),
            },
            ExpressionKind::ListInit { .. } => ExpressionKind::ListInit {
                items: children.to_vec(),
            },
            ExpressionKind::Other { label, .. } => ExpressionKind::Other {
                label: label.clone(),
                operands: children.to_vec(),
            },
        };

        Expression {
            kind,
            data_type: self.data_type.clone(),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[&ExprRef]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Constant(value) => write!(f, "{}", value),
            ExpressionKind::Parameter(param) => write!(f, "{}", param.name()),
            ExpressionKind::Member { target, member } => write!(f, "{}.{}", target, member),
            ExpressionKind::Call {
                method,
                receiver,
                args,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{}.", receiver)?;
                }
                write!(f, "{}(", method.name())?;
                write_list(f, &args.iter().collect::<Vec<_>>())?;
                write!(f, ")")
            }
            ExpressionKind::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            ExpressionKind::Unary { op, operand } => match op {
                UnaryOperator::Negate => write!(f, "-{}", operand),
                _ => write!(f, "{}({})", op.as_str(), operand),
            },
            ExpressionKind::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "IIF({}, {}, {})", test, if_true, if_false),
            ExpressionKind::Lambda(lambda) => write!(f, "{}", lambda),
            ExpressionKind::New { fields } => {
                write!(f, "new {}(", self.data_type)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", name, value)?;
                }
                write!(f, ")")
            }
            ExpressionKind::ListInit { items } => {
                write!(f, "new {} {{", self.data_type)?;
                write_list(f, &items.iter().collect::<Vec<_>>())?;
                write!(f, "}}")
            }
            ExpressionKind::Other { label, operands } => {
                write!(f, "{}(", label)?;
                write_list(f, &operands.iter().collect::<Vec<_>>())?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::method::builtins;

    fn person() -> Parameter {
        Parameter::new("p", DataType::record("Person"))
    }

    #[test]
    fn test_parameter_identity() {
        let a = Parameter::new("x", DataType::Int32);
        let b = Parameter::new("x", DataType::Int32);
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_rendering() {
        let p = person();
        let age = Expression::member(p.expr(), "Age", DataType::Int32);
        let body = Expression::and_also(
            Expression::gt(age, Expression::constant(18)),
            Expression::not(Expression::is_null(Expression::member(
                p.expr(),
                "Name",
                DataType::Varchar,
            ))),
        );
        let lambda = Lambda::new(vec![p], body);
        assert_eq!(
            lambda.to_string(),
            "p => ((p.Age > 18) AndAlso Not(IsNull(p.Name)))"
        );
    }

    #[test]
    fn test_rendering_of_composite_nodes() {
        let x = Parameter::new("x", DataType::Int32);
        let y = Parameter::new("y", DataType::Int32);

        let list = Expression::list_init(
            DataType::Int32,
            vec![Expression::constant(1), Expression::constant(2)],
        );
        assert_eq!(list.to_string(), "new List<Int32> {1, 2}");

        let call = Expression::call_method(
            list,
            builtins::contains(),
            vec![x.expr()],
            DataType::Boolean,
        );
        assert_eq!(call.to_string(), "new List<Int32> {1, 2}.contains(x)");

        let cond = Expression::conditional(
            Expression::lt(x.expr(), y.expr()),
            Expression::negate(x.expr()),
            Expression::constant("s"),
        );
        assert_eq!(cond.to_string(), "IIF((x < y), -x, \"s\")");

        let record = Expression::new_record("Point", vec![("X".into(), x.expr())]);
        assert_eq!(record.to_string(), "new Point(X = x)");

        let other = Expression::other("Extension", vec![y.expr()], DataType::Int32);
        assert_eq!(other.to_string(), "Extension(y)");

        let lambda = Lambda::new(vec![x.clone(), y.clone()], Expression::add(x.expr(), y.expr()));
        assert_eq!(lambda.to_string(), "(x, y) => (x + y)");
        assert_eq!(
            lambda.data_type(),
            DataType::Function {
                params: vec![DataType::Int32, DataType::Int32],
                ret: Box::new(DataType::Int32),
            }
        );
    }

    #[test]
    fn test_children_and_rebuild() {
        let x = Parameter::new("x", DataType::Varchar);
        let call = Expression::call_static(
            builtins::starts_with(),
            vec![x.expr(), Expression::constant("a")],
            DataType::Boolean,
        );
        assert_eq!(call.children().len(), 2);

        let rebuilt = call.with_children(&[x.expr(), Expression::constant("b")]);
        assert_eq!(rebuilt.to_string(), "starts_with(x, \"b\")");
        assert_eq!(rebuilt.data_type(), &DataType::Boolean);

        let receiver = Expression::call_method(
            x.expr(),
            builtins::ends_with(),
            vec![Expression::constant("z")],
            DataType::Boolean,
        );
        let children: Vec<ExprRef> = receiver.children().into_iter().cloned().collect();
        assert_eq!(receiver.with_children(&children), *receiver);
    }

    #[test]
    #[should_panic(expected = "child count mismatch")]
    fn test_rebuild_with_wrong_child_count_panics() {
        let x = Parameter::new("x", DataType::Int32);
        let node = Expression::add(x.expr(), Expression::constant(1));
        node.with_children(&[x.expr()]);
    }

    #[test]
    fn test_binary_result_types() {
        let x = Parameter::new("x", DataType::Int32);
        assert_eq!(
            Expression::eq(x.expr(), Expression::constant(1)).data_type(),
            &DataType::Boolean
        );
        assert_eq!(
            Expression::add(x.expr(), Expression::constant(1i64)).data_type(),
            &DataType::Int64
        );
    }
}
