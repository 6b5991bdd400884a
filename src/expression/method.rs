//! Callable methods referenced by `Call` nodes.
//!
//! A method is a named native function. The receiver of an instance call is
//! passed as the first argument, so `list.contains(x)` and `contains(list, x)`
//! invoke the same function with the same two values.

use crate::expression::error::EvaluationFault;
use crate::expression::value::Value;
use std::fmt;
use std::sync::Arc;

/// Native implementation of a method
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, EvaluationFault> + Send + Sync>;

/// A named method with a fixed number of arguments (receiver included)
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    arity: usize,
    func: NativeFn,
}

impl Method {
    pub fn new<F>(name: impl Into<Arc<str>>, arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvaluationFault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the method with receiver-first arguments
    pub fn invoke(&self, args: &[Value]) -> Result<Value, EvaluationFault> {
        if args.len() != self.arity {
            return Err(EvaluationFault::ArgumentCount {
                method: self.name.to_string(),
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.func)(args)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Builtin methods with no observable side effects
pub mod builtins {
    use super::*;
    use crate::expression::value::DataType;

    /// Names of every builtin method
    pub const PURE_BUILTINS: &[&str] = &[
        "contains",
        "len",
        "starts_with",
        "ends_with",
        "to_lowercase",
        "to_uppercase",
        "abs",
    ];

    fn invalid(method: &str, args: &[Value]) -> EvaluationFault {
        EvaluationFault::InvalidOperandTypes {
            operator: method.to_string(),
            left: args.first().map(Value::data_type).unwrap_or(DataType::Null),
            right: args.get(1).map(Value::data_type),
        }
    }

    fn null_receiver(method: &str) -> EvaluationFault {
        EvaluationFault::NullReference {
            context: format!("call to {}", method),
        }
    }

    /// Collection membership, or substring test on strings
    pub fn contains() -> Method {
        Method::new("contains", 2, |args| match (&args[0], &args[1]) {
            (Value::Null, _) => Err(null_receiver("contains")),
            (Value::Collection(c), item) => Ok(Value::Boolean(c.contains(item))),
            (Value::String(s), Value::String(needle)) => {
                Ok(Value::Boolean(s.contains(needle.as_str())))
            }
            _ => Err(invalid("contains", args)),
        })
    }

    /// Number of elements of a collection, or characters of a string
    pub fn len() -> Method {
        Method::new("len", 1, |args| match &args[0] {
            Value::Null => Err(null_receiver("len")),
            Value::Collection(c) => Ok(Value::Int32(c.len() as i32)),
            Value::String(s) => Ok(Value::Int32(s.chars().count() as i32)),
            _ => Err(invalid("len", args)),
        })
    }

    pub fn starts_with() -> Method {
        Method::new("starts_with", 2, |args| match (&args[0], &args[1]) {
            (Value::Null, _) => Err(null_receiver("starts_with")),
            (Value::String(s), Value::String(prefix)) => {
                Ok(Value::Boolean(s.starts_with(prefix.as_str())))
            }
            _ => Err(invalid("starts_with", args)),
        })
    }

    pub fn ends_with() -> Method {
        Method::new("ends_with", 2, |args| match (&args[0], &args[1]) {
            (Value::Null, _) => Err(null_receiver("ends_with")),
            (Value::String(s), Value::String(suffix)) => {
                Ok(Value::Boolean(s.ends_with(suffix.as_str())))
            }
            _ => Err(invalid("ends_with", args)),
        })
    }

    pub fn to_lowercase() -> Method {
        Method::new("to_lowercase", 1, |args| match &args[0] {
            Value::Null => Err(null_receiver("to_lowercase")),
            Value::String(s) => Ok(Value::String(s.to_lowercase())),
            _ => Err(invalid("to_lowercase", args)),
        })
    }

    pub fn to_uppercase() -> Method {
        Method::new("to_uppercase", 1, |args| match &args[0] {
            Value::Null => Err(null_receiver("to_uppercase")),
            Value::String(s) => Ok(Value::String(s.to_uppercase())),
            _ => Err(invalid("to_uppercase", args)),
        })
    }

    pub fn abs() -> Method {
        Method::new("abs", 1, |args| match &args[0] {
            Value::Null => Err(null_receiver("abs")),
            Value::Int32(n) => n.checked_abs().map(Value::Int32).ok_or(EvaluationFault::Overflow {
                operator: "abs".to_string(),
            }),
            Value::Int64(n) => n.checked_abs().map(Value::Int64).ok_or(EvaluationFault::Overflow {
                operator: "abs".to_string(),
            }),
            _ => Err(invalid("abs", args)),
        })
    }
}
