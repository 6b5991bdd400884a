//! Sample predicates over a `Person { Id, Name, Age }` entity.

use exprkey::expression::{
    builtins, Collection, DataType, ExprRef, Expression, Lambda, Method, Parameter, Record, Value,
};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub lambda: Lambda,
}

fn person() -> Parameter {
    Parameter::new("p", DataType::record("Person"))
}

fn field(p: &Parameter, name: &str, data_type: DataType) -> ExprRef {
    Expression::member(p.expr(), name, data_type)
}

/// Captured state holding a single field, read through a member access
fn captured(name: &str, value: Value, data_type: DataType) -> ExprRef {
    let closure = Record::new("Closure").with_field(name, value);
    Expression::member(Expression::constant(Value::record(closure)), name, data_type)
}

fn captured_ids(ids: &[i32], capacity: usize) -> ExprRef {
    let items = ids.iter().copied().map(Value::Int32).collect();
    let collection = Collection::with_capacity(DataType::Int32, items, capacity);
    captured(
        "ids",
        Value::Collection(Arc::new(collection)),
        DataType::list(DataType::Int32),
    )
}

fn id_in(ids: ExprRef) -> Lambda {
    let p = person();
    let id = field(&p, "Id", DataType::Int32);
    Lambda::new(
        vec![p],
        Expression::call_method(ids, builtins::contains(), vec![id], DataType::Boolean),
    )
}

static NEXT_TICKET: AtomicI32 = AtomicI32::new(1);

fn next_ticket() -> Method {
    Method::new("next_ticket", 0, |_| {
        Ok(Value::Int32(NEXT_TICKET.fetch_add(1, Ordering::SeqCst)))
    })
}

pub fn all() -> Vec<Sample> {
    let adult = {
        let p = person();
        let limit = Expression::add(Expression::constant(10), Expression::constant(8));
        Lambda::new(
            vec![p.clone()],
            Expression::ge(field(&p, "Age", DataType::Int32), limit),
        )
    };

    let prefixed = {
        let p = person();
        let prefix = captured("prefix", "A".into(), DataType::Varchar);
        Lambda::new(
            vec![p.clone()],
            Expression::call_method(
                field(&p, "Name", DataType::Varchar),
                builtins::starts_with(),
                vec![prefix],
                DataType::Boolean,
            ),
        )
    };

    let literal_ids = {
        let list = Expression::list_init(
            DataType::Int32,
            vec![Expression::constant(1), Expression::constant(2)],
        );
        id_in(list)
    };

    let ticket = {
        let p = person();
        let call = Expression::call_static(next_ticket(), vec![], DataType::Int32);
        Lambda::new(
            vec![p.clone()],
            Expression::eq(field(&p, "Id", DataType::Int32), call),
        )
    };

    let name = {
        let p = person();
        Lambda::new(vec![p.clone()], field(&p, "Name", DataType::Varchar))
    };

    vec![
        Sample {
            name: "adult",
            description: "age compared against a constant sum",
            lambda: adult,
        },
        Sample {
            name: "prefixed",
            description: "name prefix read from captured state",
            lambda: prefixed,
        },
        Sample {
            name: "vip-ids",
            description: "id contained in a captured list",
            lambda: id_in(captured_ids(&[3, 5, 8], 4)),
        },
        Sample {
            name: "vip-ids-copy",
            description: "same ids, separately allocated with a larger capacity",
            lambda: id_in(captured_ids(&[3, 5, 8], 32)),
        },
        Sample {
            name: "nobody",
            description: "id contained in an empty captured list",
            lambda: id_in(captured_ids(&[], 0)),
        },
        Sample {
            name: "literal-ids",
            description: "id contained in a list literal",
            lambda: literal_ids,
        },
        Sample {
            name: "ticket",
            description: "id compared against a side-effecting call",
            lambda: ticket,
        },
        Sample {
            name: "name",
            description: "string-valued selector",
            lambda: name,
        },
    ]
}
