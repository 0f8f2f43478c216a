use super::*;
use crate::errors::ValueError;
use crate::temp::{temp_float, temp_generic_null, temp_int, temp_null_ref, temp_string};
use crate::test_helpers::{animal_hierarchy, color_enum};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn widening_scalar_assignment_is_exact() {
    let pool = TypePool::new();
    let target = Value::Float(FloatValue::new(None, 0.0));
    let result = temp_int(3).assign_to(&target, &pool).unwrap();
    assert!(result.is_exact());
    assert_eq!(target.as_scalar(), Some(Scalar::Float(3.0)));
}

#[test]
fn narrowing_scalar_assignment_is_lossy() {
    let pool = TypePool::new();
    let target = Value::Int(IntValue::new(None, 0));
    let result = temp_float(2.9).assign_to(&target, &pool).unwrap();
    assert!(!result.is_exact());
    assert_eq!(target.as_scalar(), Some(Scalar::Int(2)));

    let byte_target = Value::Byte(ByteValue::new(None, 0));
    let result = temp_int(300).assign_to(&byte_target, &pool).unwrap();
    assert!(!result.is_exact());
    assert_eq!(byte_target.as_scalar(), Some(Scalar::Byte(44)));
}

#[test]
fn unconvertible_scalar_assignment_fails() {
    let pool = TypePool::new();
    let target = Value::Float(FloatValue::new(None, 0.0));
    assert_eq!(
        temp_bool_value().assign_to(&target, &pool),
        Err(ValueError::illegal_assignment("bool", "float"))
    );
}

fn temp_bool_value() -> Value {
    Value::Bool(BoolValue::new(None, true))
}

#[test]
fn void_and_const_targets_reject_assignment() {
    let pool = TypePool::new();
    assert_eq!(
        temp_int(1).assign_to(&Value::Void, &pool),
        Err(ValueError::illegal_assignment("int", "void"))
    );

    let sealed = Value::Int(IntValue::new(None, 5));
    sealed.seal();
    assert_eq!(
        temp_int(1).assign_to(&sealed, &pool),
        Err(ValueError::ConstViolation)
    );
}

#[test]
fn untyped_target_boxes_any_source() {
    let pool = TypePool::new();
    let boxed = UntypedValue::new(None, &temp_int(1), &pool).unwrap();
    let target = Value::Untyped(boxed.clone());

    let result = temp_string(&pool, "hi").unwrap().assign_to(&target, &pool);
    assert!(result.unwrap().is_exact());
    assert!(matches!(boxed.actual(), Value::Reference(_)));

    // Boxed content is a replica; the box is still an int box after
    // assigning an int, not an alias of the source cell.
    temp_int(9).assign_to(&target, &pool).unwrap();
    assert_eq!(boxed.actual().as_scalar(), Some(Scalar::Int(9)));
}

#[test]
fn object_source_assigns_through_a_fresh_reference() {
    let pool = TypePool::new();
    let (animal, dog) = animal_hierarchy(&pool);
    let instance = ObjectValue::new(&pool, None, dog).unwrap();

    let slot = temp_null_ref(animal);
    let result = Value::Object(instance.clone()).assign_to(&slot, &pool).unwrap();
    // Dog into an Animal slot narrows the static view.
    assert!(!result.is_exact());
    assert!(matches!(slot.deref(), Value::Object(o) if o.same_instance(&instance)));
}

#[test]
fn numeric_equality_crosses_kinds() {
    let pool = TypePool::new();
    assert!(temp_int(3).is_equal_to(&temp_float(3.0), &pool));
    assert!(temp_int(3).is_equal_to(&Value::Byte(ByteValue::new(None, 3)), &pool));
    assert!(!temp_int(1).is_equal_to(&temp_bool_value(), &pool));
    assert!(!Value::Char(CharValue::new(None, 'a')).is_equal_to(&temp_int(97), &pool));
}

#[test]
fn string_equality_compares_content() {
    let pool = TypePool::new();
    let a = temp_string(&pool, "abc").unwrap();
    let b = temp_string(&pool, "abc").unwrap();
    let c = temp_string(&pool, "abd").unwrap();
    assert!(a.is_equal_to(&b, &pool));
    assert!(!a.is_equal_to(&c, &pool));
}

#[test]
fn null_equality_follows_declared_types() {
    let pool = TypePool::new();
    let (animal, dog) = animal_hierarchy(&pool);

    assert!(temp_generic_null().is_equal_to(&temp_null_ref(animal), &pool));
    assert!(temp_null_ref(dog).is_equal_to(&temp_null_ref(animal), &pool));
    assert!(temp_null_ref(animal).is_equal_to(&temp_null_ref(dog), &pool));

    let unrelated = pool.register_class(quill_types::ClassData::new("Rock", TypeId::OBJECT));
    assert!(!temp_null_ref(animal).is_equal_to(&temp_null_ref(unrelated), &pool));

    let instance = ObjectValue::new(&pool, None, dog).unwrap();
    let live = crate::temp::temp_ref(&pool, Value::Object(instance)).unwrap();
    assert!(!live.is_equal_to(&temp_null_ref(dog), &pool));
}

#[test]
fn untyped_boxes_compare_through_content() {
    let pool = TypePool::new();
    let boxed = Value::Untyped(UntypedValue::new(None, &temp_int(7), &pool).unwrap());
    assert!(boxed.is_equal_to(&temp_int(7), &pool));
    assert!(temp_int(7).is_equal_to(&boxed, &pool));
}

#[test]
fn scalar_replicates_to_string_and_any() {
    let pool = TypePool::new();
    let as_string = temp_int(42)
        .replicate_as(&pool, None, TypeId::STRING)
        .unwrap()
        .unwrap();
    assert!(matches!(&as_string, Value::Object(o) if o.as_str().as_deref() == Some("42")));

    let as_any = temp_float(1.5)
        .replicate_as(&pool, None, TypeId::ANY)
        .unwrap()
        .unwrap();
    assert_eq!(as_any.deref().as_scalar(), Some(Scalar::Float(1.5)));
}

#[test]
fn string_replicates_to_scalars_by_parsing() {
    let pool = TypePool::new();
    let text = temp_string(&pool, "2.5").unwrap();
    let parsed = text
        .replicate_as(&pool, None, TypeId::FLOAT)
        .unwrap()
        .unwrap();
    assert_eq!(parsed.as_scalar(), Some(Scalar::Float(2.5)));

    let junk = temp_string(&pool, "not a float").unwrap();
    assert_eq!(
        junk.replicate_as(&pool, None, TypeId::INT).unwrap_err(),
        ValueError::illegal_casting("String", "int")
    );
}

#[test]
fn enum_constants_replicate_to_ordinal_and_literal() {
    let pool = TypePool::new();
    let color = color_enum(&pool);
    let green = ObjectValue::new_enum(&pool, None, color, 1, "GREEN").unwrap();

    let ordinal = Value::Object(green.clone())
        .replicate_as(&pool, None, TypeId::INT)
        .unwrap()
        .unwrap();
    assert_eq!(ordinal.as_scalar(), Some(Scalar::Int(1)));

    let literal = Value::Object(green)
        .replicate_as(&pool, None, TypeId::STRING)
        .unwrap()
        .unwrap();
    assert!(matches!(&literal, Value::Object(o) if o.as_str().as_deref() == Some("GREEN")));
}

#[test]
fn undefined_replication_pairs_answer_none() {
    let pool = TypePool::new();
    let (animal, _) = animal_hierarchy(&pool);
    assert!(temp_int(1).replicate_as(&pool, None, animal).unwrap().is_none());
}

#[test]
fn null_replicates_to_a_typed_null() {
    let pool = TypePool::new();
    let (animal, dog) = animal_hierarchy(&pool);
    let replicated = temp_null_ref(animal)
        .replicate_as(&pool, None, dog)
        .unwrap()
        .unwrap();
    assert!(matches!(&replicated, Value::Reference(r) if r.declared_type() == Some(dog)));
}

#[test]
fn generic_null_presents_no_type() {
    let pool = TypePool::new();
    let null = temp_generic_null();
    assert_eq!(null.type_id(&pool), None);
    assert_eq!(null.type_name(&pool), "null");
    assert!(null.is_null());
    assert!(matches!(null.deref(), Value::Reference(_)));
}

proptest! {
    #[test]
    fn float_assignment_truncates_like_trunc(v in -1.0e15f64..1.0e15) {
        let pool = TypePool::new();
        let target = Value::Int(IntValue::new(None, 0));
        temp_float(v).assign_to(&target, &pool).unwrap();
        prop_assert_eq!(target.as_scalar(), Some(Scalar::Int(v.trunc() as i64)));
    }

    #[test]
    fn int_string_replication_round_trips(v in any::<i64>()) {
        let pool = TypePool::new();
        let text = temp_int(v).replicate_as(&pool, None, TypeId::STRING).unwrap().unwrap();
        let back = text.replicate_as(&pool, None, TypeId::INT).unwrap().unwrap();
        prop_assert_eq!(back.as_scalar(), Some(Scalar::Int(v)));
    }
}
