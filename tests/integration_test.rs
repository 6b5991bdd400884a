use exprkey::canonical::{to_expression_string, Canonicalizer};
use exprkey::expression::{
    builtins, Collection, DataType, EvaluationFault, ExprRef, Expression, ExpressionError, Lambda,
    Parameter, Record, Value,
};
use exprkey::transform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::thread;

fn entity() -> Parameter {
    Parameter::new("x", DataType::record("Entity"))
}

fn value_of(x: &Parameter) -> ExprRef {
    Expression::member(x.expr(), "value", DataType::Int32)
}

fn entity_value(n: i32) -> Value {
    Value::record(Record::new("Entity").with_field("value", Value::Int32(n)))
}

fn key(lambda: &Lambda) -> String {
    to_expression_string(Some(lambda))
        .expect("canonicalization failed")
        .expect("key expected for a lambda")
}

fn contains(collection: ExprRef, element: ExprRef) -> ExprRef {
    Expression::call_method(collection, builtins::contains(), vec![element], DataType::Boolean)
}

fn captured_list(items: &[i32], capacity: usize) -> ExprRef {
    let collection = Collection::with_capacity(
        DataType::Int32,
        items.iter().copied().map(Value::Int32).collect(),
        capacity,
    );
    let closure = Record::new("Closure").with_field("list", Value::Collection(Arc::new(collection)));
    Expression::member(
        Expression::constant(Value::record(closure)),
        "list",
        DataType::list(DataType::Int32),
    )
}

/// Random comparison of `x.value` against a constant, sometimes with a
/// foldable constant sub-tree on the right
fn random_predicate(rng: &mut StdRng) -> Lambda {
    let x = entity();
    let constant = if rng.gen_bool(0.5) {
        Expression::constant(rng.gen_range(-5..5))
    } else {
        Expression::add(
            Expression::constant(rng.gen_range(-5..5)),
            Expression::constant(rng.gen_range(-5..5)),
        )
    };
    let body = match rng.gen_range(0..6) {
        0 => Expression::eq(value_of(&x), constant),
        1 => Expression::ne(value_of(&x), constant),
        2 => Expression::lt(value_of(&x), constant),
        3 => Expression::le(value_of(&x), constant),
        4 => Expression::gt(value_of(&x), constant),
        _ => Expression::ge(value_of(&x), constant),
    };
    Lambda::new(vec![x], body)
}

fn eval_bool(lambda: &Lambda, v: i32) -> bool {
    lambda
        .invoke(&[entity_value(v)])
        .expect("predicate evaluation failed")
        .as_bool()
        .expect("predicate returned a non-boolean")
}

#[test]
fn test_keys_are_non_blank() {
    let x = entity();
    let selector = Lambda::new(
        vec![x.clone()],
        Expression::member(x.expr(), "Name", DataType::Varchar),
    );
    assert!(!key(&selector).trim().is_empty());

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        assert!(!key(&random_predicate(&mut rng)).trim().is_empty());
    }
}

#[test]
fn test_keys_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..50 {
        let predicate = random_predicate(&mut rng);
        assert_eq!(key(&predicate), key(&predicate));
    }

    // Separately built, structurally identical lambdas share a key
    let a = Lambda::new(vec![entity()], Expression::constant(true));
    let b = Lambda::new(vec![entity()], Expression::constant(true));
    assert_eq!(key(&a), key(&b));
}

#[test]
fn test_equal_collections_share_a_key() {
    let x = entity();
    let first = Lambda::new(vec![x.clone()], contains(captured_list(&[1, 2, 3], 3), value_of(&x)));
    let y = entity();
    let second = Lambda::new(vec![y.clone()], contains(captured_list(&[1, 2, 3], 128), value_of(&y)));

    assert_eq!(key(&first), key(&second));
    assert_eq!(
        key(&first),
        "x => (((x.value == 1) OrElse (x.value == 2)) OrElse (x.value == 3))"
    );

    let reordered = Lambda::new(vec![x.clone()], contains(captured_list(&[3, 2, 1], 3), value_of(&x)));
    assert_ne!(key(&first), key(&reordered));
}

#[test]
fn test_empty_collection_matches_false() {
    let x = entity();
    let empty = Lambda::new(vec![x.clone()], contains(captured_list(&[], 16), value_of(&x)));
    let never = Lambda::new(vec![entity()], Expression::constant(false));
    assert_eq!(key(&empty), key(&never));
    assert_eq!(key(&empty), "x => false");
}

#[test]
fn test_constant_subexpressions_are_folded() {
    let x = entity();
    let summed = Lambda::new(
        vec![x.clone()],
        Expression::gt(
            value_of(&x),
            Expression::add(Expression::constant(2), Expression::constant(3)),
        ),
    );
    let y = entity();
    let literal = Lambda::new(
        vec![y.clone()],
        Expression::gt(value_of(&y), Expression::constant(5)),
    );
    assert_eq!(key(&summed), key(&literal));
}

#[test]
fn test_composition_matches_native_operators() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..40 {
        let p = random_predicate(&mut rng);
        let q = random_predicate(&mut rng);

        let and = transform::and(&p, &q).unwrap();
        let and_also = transform::and_also(&p, &q).unwrap();
        let or = transform::or(&p, &q).unwrap();
        let or_else = transform::or_else(&p, &q).unwrap();

        for v in -8..8 {
            let (pv, qv) = (eval_bool(&p, v), eval_bool(&q, v));
            assert_eq!(eval_bool(&and, v), pv && qv);
            assert_eq!(eval_bool(&and_also, v), pv && qv);
            assert_eq!(eval_bool(&or, v), pv || qv);
            assert_eq!(eval_bool(&or_else, v), pv || qv);
        }
    }
}

#[test]
fn test_reduction_preserves_meaning() {
    let x = entity();
    let original = Lambda::new(
        vec![x.clone()],
        Expression::or_else(
            contains(captured_list(&[2, 4, 6], 3), value_of(&x)),
            Expression::lt(
                value_of(&x),
                Expression::sub(Expression::constant(0), Expression::constant(3)),
            ),
        ),
    );
    let reduced = Canonicalizer::default().reduce(&original).unwrap();
    for v in -6..8 {
        assert_eq!(eval_bool(&reduced, v), eval_bool(&original, v), "v = {}", v);
    }
}

#[test]
fn test_none_returns_none() {
    assert_eq!(to_expression_string(None), Ok(None));
}

#[test]
fn test_arity_mismatch_has_no_result() {
    let single = random_predicate(&mut StdRng::seed_from_u64(1));
    let a = entity();
    let b = entity();
    let pair = Lambda::new(
        vec![a.clone(), b.clone()],
        Expression::eq(value_of(&a), value_of(&b)),
    );

    for result in [
        transform::and(&single, &pair),
        transform::and_also(&single, &pair),
        transform::or(&single, &pair),
        transform::or_else(&pair, &single),
    ] {
        assert!(matches!(result, Err(ExpressionError::ArityMismatch { .. })));
    }
}

#[test]
fn test_evaluation_failures_propagate() {
    let x = entity();
    let missing = Expression::member(
        Expression::constant(Value::record(Record::new("Closure"))),
        "limit",
        DataType::Int32,
    );
    let lambda = Lambda::new(vec![x.clone()], Expression::gt(value_of(&x), missing));
    assert!(matches!(
        to_expression_string(Some(&lambda)),
        Err(ExpressionError::EvaluationFailure(
            EvaluationFault::UnknownMember { .. }
        ))
    ));
}

#[test]
fn test_composed_key_after_rebinding() {
    let x = entity();
    let low = Lambda::new(vec![x.clone()], Expression::ge(value_of(&x), Expression::constant(1)));
    let y = entity();
    let listed = Lambda::new(vec![y.clone()], contains(captured_list(&[7], 1), value_of(&y)));

    let combined = low.and_also(&listed).unwrap();
    assert_eq!(
        key(&combined),
        "x => ((x.value >= 1) AndAlso (x.value == 7))"
    );
    assert!(eval_bool(&combined, 7));
    assert!(!eval_bool(&combined, 3));
}

#[test]
fn test_concurrent_canonicalization() {
    let x = entity();
    let shared = Lambda::new(
        vec![x.clone()],
        Expression::and_also(
            contains(captured_list(&[1, 2], 2), value_of(&x)),
            Expression::ne(value_of(&x), Expression::mul(Expression::constant(3), Expression::constant(3))),
        ),
    );
    let expected = key(&shared);

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| key(&shared))).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
