use super::*;
use crate::temp::{temp_int, temp_string};
use crate::test_helpers::color_enum;
use crate::value::Scalar;
use pretty_assertions::assert_eq;
use quill_types::{ClassData, MemberDecl};

fn counter_class(pool: &TypePool) -> TypeId {
    pool.register_class(ClassData::new("Counter", TypeId::OBJECT).with_members(vec![
        MemberDecl::field("count", TypeId::INT).with_static(true),
        MemberDecl::field("LIMIT", TypeId::INT)
            .with_static(true)
            .with_const(true),
        MemberDecl::field("label", TypeId::INT),
    ]))
}

#[test]
fn static_members_exclude_instance_fields() {
    let pool = TypePool::new();
    let class = counter_class(&pool);
    let type_value = TypeValue::new(&pool, None, class).unwrap();

    assert_eq!(type_value.represented(), class);
    assert!(type_value.static_member("count").is_ok());
    assert_eq!(
        type_value.static_member("label").unwrap_err(),
        ValueError::UnknownMember { name: "label".into() }
    );
}

#[test]
fn const_statics_stay_writable_until_sealed() {
    let pool = TypePool::new();
    let class = counter_class(&pool);
    let type_value = TypeValue::new(&pool, None, class).unwrap();

    // The class initializer writes the real value, then seals.
    let limit = type_value.static_member("LIMIT").unwrap();
    temp_int(100).assign_to(&limit, &pool).unwrap();
    type_value.seal_consts(&pool);

    assert_eq!(
        temp_int(200).assign_to(&limit, &pool).unwrap_err(),
        ValueError::ConstViolation
    );
    assert_eq!(limit.as_scalar(), Some(Scalar::Int(100)));

    // Non-const statics are untouched by sealing.
    let count = type_value.static_member("count").unwrap();
    temp_int(1).assign_to(&count, &pool).unwrap();
}

#[test]
fn enum_type_values_carry_their_constants() {
    let pool = TypePool::new();
    let color = color_enum(&pool);
    let type_value = TypeValue::new(&pool, None, color).unwrap();

    let mut names = type_value.static_member_names();
    names.sort();
    assert_eq!(names, vec!["BLUE", "GREEN", "RED"]);

    let green = type_value.static_member("GREEN").unwrap();
    assert!(green.is_const());
    let Value::Object(constant) = green.deref() else {
        panic!("enum constant members deref to enum objects");
    };
    assert_eq!(constant.ordinal(), Some(1));
    assert_eq!(constant.literal().as_deref(), Some("GREEN"));
}

#[test]
fn reflective_object_is_created_once() {
    let pool = TypePool::new();
    let class = counter_class(&pool);
    let type_value = TypeValue::new(&pool, None, class).unwrap();

    let first = type_value
        .reflective(|| temp_string(&pool, "reflection"))
        .unwrap();
    let second = type_value
        .reflective(|| panic!("factory must not run twice"))
        .unwrap();
    assert!(first.is_equal_to(&second, &pool));

    // A failing factory leaves the cache empty for a later retry.
    let other = TypeValue::new(&pool, None, class).unwrap();
    assert!(other
        .reflective(|| Err(ValueError::argument("reflection")))
        .is_err());
    assert!(other.reflective(|| temp_string(&pool, "ok")).is_ok());
}

#[test]
fn type_values_compare_by_represented_type() {
    let pool = TypePool::new();
    let class = counter_class(&pool);
    let a = TypeValue::new(&pool, None, class).unwrap();
    let b = TypeValue::new(&pool, None, class).unwrap();
    let other = TypeValue::new(&pool, None, TypeId::OBJECT).unwrap();
    assert!(a.type_equals(&b));
    assert!(!a.type_equals(&other));
    assert!(a.is_const());
}

#[test]
fn non_class_type_values_have_no_members() {
    let pool = TypePool::new();
    let type_value = TypeValue::new(&pool, None, TypeId::INT).unwrap();
    assert!(type_value.static_member_names().is_empty());
    assert!(type_value.static_member("anything").is_err());
}
