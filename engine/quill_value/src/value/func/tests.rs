use super::*;
use crate::temp::temp_int;
use crate::value::member_storage::member_function;
use pretty_assertions::assert_eq;
use quill_types::{CallableData, Param};

fn add_callable(pool: &TypePool) -> TypeId {
    pool.register_callable(CallableData::function(
        "add",
        vec![Param::new("a", TypeId::INT), Param::new("b", TypeId::INT)],
        TypeId::INT,
    ))
}

#[test]
fn binding_tables_replace_in_place() {
    let mut table = BindingTable::new();
    table.insert("a", temp_int(1));
    table.insert("b", temp_int(2));
    table.insert("a", temp_int(3));

    assert_eq!(table.len(), 2);
    let order: Vec<&str> = table.iter().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["a", "b"]);
    assert_eq!(
        table.get("a").and_then(Value::as_scalar),
        Some(crate::value::Scalar::Int(3))
    );
    assert!(table.get("c").is_none());
}

#[test]
fn functions_are_const_instances_of_the_function_class() {
    let pool = TypePool::new();
    let func = FuncValue::global(&pool, None, add_callable(&pool)).unwrap();
    assert!(func.is_const());
    assert_eq!(func.kind(&pool), Some(CallableKind::Function));
    assert_eq!(Value::Function(func.clone()).type_id(&pool), Some(func.callable_type()));
    assert_eq!(func.display_name(&pool), "add");
}

#[test]
fn functions_carry_bind_and_invoke_members() {
    let pool = TypePool::new();
    let func = FuncValue::global(&pool, None, add_callable(&pool)).unwrap();

    let bind = func.member("bind").unwrap();
    let invoke = func.member("invoke").unwrap();
    assert!(member_function(&bind).is_some());
    assert!(member_function(&invoke).is_some());
    assert_eq!(
        func.member("nope").unwrap_err(),
        ValueError::UnknownMember { name: "nope".into() }
    );
}

#[test]
fn function_members_of_function_members_resolve() {
    let pool = TypePool::new();
    let func = FuncValue::global(&pool, None, add_callable(&pool)).unwrap();

    // bind is itself a function value; its own bind member must resolve
    // without having recursed at construction time.
    let bind = member_function(&func.member("bind").unwrap()).unwrap();
    let nested = bind.member("bind").unwrap();
    assert!(member_function(&nested).is_some());
    assert_eq!(bind.kind(&pool), Some(CallableKind::Method));
}

#[test]
fn lambdas_report_their_display_form() {
    let pool = TypePool::new();
    let callable = pool.register_callable(CallableData::lambda(
        vec![Param::new("x", TypeId::INT)],
        TypeId::INT,
    ));
    let lambda =
        FuncValue::lambda(&pool, None, callable, Some("(x) => x * 2".into())).unwrap();
    assert_eq!(lambda.display_form(), Some("(x) => x * 2"));
    assert_eq!(lambda.display_name(&pool), "(x) => x * 2");
}

#[test]
fn method_groups_bundle_their_overloads() {
    let pool = TypePool::new();
    let m0 = pool.register_callable(CallableData::method(
        "work",
        TypeId::OBJECT,
        vec![],
        TypeId::VOID,
    ));
    let m1 = pool.register_callable(CallableData::method(
        "work",
        TypeId::OBJECT,
        vec![Param::new("n", TypeId::INT)],
        TypeId::VOID,
    ));
    let members = vec![
        FuncValue::detached(&pool, None, m0, true).unwrap(),
        FuncValue::detached(&pool, None, m1, true).unwrap(),
    ];
    let group = FuncValue::method_group(&pool, None, members).unwrap();

    assert_eq!(group.kind(&pool), Some(CallableKind::MethodGroup));
    assert_eq!(group.overloads().len(), 2);
    assert_eq!(group.overloads()[0].callable_type(), m0);
}

#[test]
fn empty_method_groups_are_rejected() {
    let pool = TypePool::new();
    assert_eq!(
        FuncValue::method_group(&pool, None, Vec::new()).unwrap_err(),
        ValueError::argument("members")
    );
}

#[test]
fn function_identity_is_the_handle() {
    let pool = TypePool::new();
    let a = FuncValue::global(&pool, None, add_callable(&pool)).unwrap();
    let b = FuncValue::global(&pool, None, a.callable_type()).unwrap();
    assert!(a.same_function(&a.clone()));
    assert!(!a.same_function(&b));
    assert!(Value::Function(a.clone()).is_equal_to(&Value::Function(a.clone()), &pool));
    assert!(!Value::Function(a).is_equal_to(&Value::Function(b), &pool));
}
