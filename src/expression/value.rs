//! Runtime values and static types.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Static type of an expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Varchar,
    /// Homogeneous local collection
    List(Box<DataType>),
    /// Named record type (entities, closure captures)
    Record(Arc<str>),
    /// Lambda with parameter types and a result type
    Function {
        params: Vec<DataType>,
        ret: Box<DataType>,
    },
    /// Type of a bare `null` constant
    Null,
}

impl DataType {
    pub fn list(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }

    pub fn record(name: impl Into<Arc<str>>) -> Self {
        DataType::Record(name.into())
    }

    /// Element type if this is a collection type
    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::List(element) => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => write!(f, "Boolean"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Varchar => write!(f, "String"),
            DataType::List(element) => write!(f, "List<{}>", element),
            DataType::Record(name) => write!(f, "{}", name),
            DataType::Function { params, ret } => {
                write!(f, "Func<")?;
                for param in params {
                    write!(f, "{}, ", param)?;
                }
                write!(f, "{}>", ret)
            }
            DataType::Null => write!(f, "Object"),
        }
    }
}

static NEXT_COLLECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A local collection captured by a predicate.
///
/// Each instance gets its own id, and keeps the capacity it was allocated
/// with. Neither is part of the collection's rendering or equality: two
/// collections with the same element type and items are equal.
#[derive(Debug)]
pub struct Collection {
    id: u64,
    capacity: usize,
    element_type: DataType,
    items: Vec<Value>,
}

impl Collection {
    pub fn new(element_type: DataType, items: Vec<Value>) -> Self {
        let capacity = items.capacity();
        Self::with_capacity(element_type, items, capacity)
    }

    pub fn with_capacity(element_type: DataType, items: Vec<Value>, capacity: usize) -> Self {
        Self {
            id: NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed),
            capacity: capacity.max(items.len()),
            element_type,
            items,
        }
    }

    /// Instance identity, unique per allocation
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn element_type(&self) -> &DataType {
        &self.element_type
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.iter().any(|item| item == value)
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.element_type == other.element_type && self.items == other.items
    }
}

/// A record value: an entity instance or a closure's captured state
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: Arc<str>,
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    pub fn new(type_name: impl Into<Arc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field; field order is preserved in renderings
    pub fn with_field(mut self, name: impl Into<Arc<str>>, value: Value) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[(Arc<str>, Value)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field.as_ref() == name)
            .map(|(_, value)| value)
    }
}

/// Runtime values produced by evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    String(String),
    Collection(Arc<Collection>),
    Record(Arc<Record>),
}

impl Value {
    pub fn collection(element_type: DataType, items: Vec<Value>) -> Self {
        Value::Collection(Arc::new(Collection::new(element_type, items)))
    }

    pub fn record(record: Record) -> Self {
        Value::Record(Arc::new(record))
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::String(_) => DataType::Varchar,
            Value::Collection(c) => DataType::list(c.element_type().clone()),
            Value::Record(r) => DataType::Record(r.type_name.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}L", n),
            Value::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Value::Collection(c) => {
                write!(f, "List<{}> [", c.element_type())?;
                for (i, item) in c.items().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(r) => {
                write!(f, "{} {{", r.type_name())?;
                for (i, (name, value)) in r.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {} = {}", name, value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_identity_not_part_of_equality() {
        let a = Collection::new(DataType::Int32, vec![Value::Int32(1), Value::Int32(2)]);
        let b = Collection::with_capacity(
            DataType::Int32,
            vec![Value::Int32(1), Value::Int32(2)],
            64,
        );
        assert_ne!(a.id(), b.id());
        assert_eq!(b.capacity(), 64);
        assert_eq!(a, b);
        assert_eq!(
            Value::Collection(Arc::new(a)).to_string(),
            Value::Collection(Arc::new(b)).to_string()
        );
    }

    #[test]
    fn test_capacity_never_below_len() {
        let c = Collection::with_capacity(DataType::Int32, vec![Value::Int32(1); 3], 1);
        assert_eq!(c.capacity(), 3);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::Int32(-4).to_string(), "-4");
        assert_eq!(Value::Int64(7).to_string(), "7L");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(
            Value::collection(DataType::Varchar, vec!["x".into(), "y".into()]).to_string(),
            "List<String> [\"x\", \"y\"]"
        );
        let record = Record::new("Person")
            .with_field("Name", "Ann".into())
            .with_field("Age", Value::Int32(30));
        assert_eq!(
            Value::record(record).to_string(),
            "Person { Name = \"Ann\", Age = 30 }"
        );
    }

    #[test]
    fn test_data_types() {
        assert_eq!(Value::Int32(1).data_type(), DataType::Int32);
        assert_eq!(
            Value::collection(DataType::Int64, vec![]).data_type(),
            DataType::list(DataType::Int64)
        );
        assert_eq!(DataType::list(DataType::Int32).to_string(), "List<Int32>");
        assert_eq!(
            DataType::list(DataType::Varchar).element_type(),
            Some(&DataType::Varchar)
        );
        let func = DataType::Function {
            params: vec![DataType::record("Person")],
            ret: Box::new(DataType::Boolean),
        };
        assert_eq!(func.to_string(), "Func<Person, Boolean>");
    }

    #[test]
    fn test_record_field_lookup() {
        let record = Record::new("Person").with_field("Age", Value::Int32(3));
        assert_eq!(record.field("Age"), Some(&Value::Int32(3)));
        assert_eq!(record.field("Name"), None);
        assert_eq!(record.type_name(), "Person");
    }
}
