use super::*;
use crate::temp::{temp_bool, temp_float, temp_generic_null, temp_int};
use crate::test_helpers::animal_hierarchy;
use crate::value::member_storage::member_function;
use crate::value::{DynamicConfig, ObjectValue, Scalar};
use pretty_assertions::assert_eq;
use quill_types::CallableData;

fn add_func(pool: &TypePool) -> FuncValue {
    let callable = pool.register_callable(CallableData::function(
        "add",
        vec![
            Param::new("a", TypeId::INT),
            Param::new("b", TypeId::INT),
        ],
        TypeId::INT,
    ));
    FuncValue::global(pool, None, callable).unwrap()
}

#[test]
fn leading_arguments_fold_out_of_the_signature() {
    let pool = TypePool::new();
    let func = add_func(&pool);

    let bound = bind(&pool, None, &func, None, &[temp_int(5)]).unwrap();
    let data = pool.callable_data(bound.callable_type()).unwrap();
    assert_eq!(data.params.len(), 1);
    assert_eq!(data.params[0].name, "b");

    let a = bound.bindings().get("a").cloned().unwrap();
    assert_eq!(a.as_scalar(), Some(Scalar::Int(5)));
    assert!(a.is_const());

    // The source is untouched.
    assert!(func.bindings().is_empty());
    let rest = bind(&pool, None, &bound, None, &[temp_int(6)]).unwrap();
    assert_eq!(
        pool.callable_data(rest.callable_type()).unwrap().params.len(),
        0
    );
}

#[test]
fn bound_arguments_are_replicas() {
    let pool = TypePool::new();
    let func = add_func(&pool);
    let arg = temp_int(5);
    let bound = bind(&pool, None, &func, None, std::slice::from_ref(&arg)).unwrap();

    let Value::Int(cell) = arg else {
        panic!("expected an int temp");
    };
    cell.set(9).unwrap();
    assert_eq!(
        bound.bindings().get("a").and_then(|v| v.as_scalar()),
        Some(Scalar::Int(5))
    );
}

#[test]
fn convertible_arguments_bind_and_unconvertible_ones_fail() {
    let pool = TypePool::new();
    let func = add_func(&pool);

    // float to int is a legal (demoting) conversion.
    assert!(bind(&pool, None, &func, None, &[temp_float(1.5)]).is_ok());

    let err = bind(&pool, None, &func, None, &[temp_bool(true)]).unwrap_err();
    assert!(matches!(err, ValueError::IllegalBinding { .. }));
}

#[test]
fn excess_arguments_are_rejected() {
    let pool = TypePool::new();
    let func = add_func(&pool);
    let args = vec![temp_int(1), temp_int(2), temp_int(3)];
    assert!(matches!(
        bind(&pool, None, &func, None, &args).unwrap_err(),
        ValueError::IllegalBinding { .. }
    ));
}

#[test]
fn free_functions_take_this_as_a_local_binding() {
    let pool = TypePool::new();
    let (animal, _) = animal_hierarchy(&pool);
    let func = add_func(&pool);
    let receiver = Value::Object(ObjectValue::new(&pool, None, animal).unwrap());

    let bound = bind(&pool, None, &func, Some(&receiver), &[]).unwrap();
    assert!(bound.this().is_none());
    let local = bound.bindings().get("this").cloned().unwrap();
    assert!(local.is_const());
    assert!(matches!(local.deref(), Value::Object(_)));
}

#[test]
fn instance_methods_rebind_only_to_the_exact_containing_type() {
    let pool = TypePool::new();
    let (animal, dog) = animal_hierarchy(&pool);
    let instance = ObjectValue::new(&pool, None, animal).unwrap();
    let fetchable = ObjectValue::new(&pool, None, dog).unwrap();
    let method = member_function(&fetchable.member("fetch").unwrap()).unwrap();

    // fetch is declared on Animal, so an Animal receiver is accepted.
    let receiver = Value::Object(instance.clone());
    let rebound = bind(&pool, None, &method, Some(&receiver), &[]).unwrap();
    assert!(
        matches!(rebound.this().unwrap().deref(), Value::Object(o) if o.same_instance(&instance))
    );

    // A Dog receiver is a subtype, not the containing type itself.
    let dog_receiver = Value::Object(fetchable);
    assert!(matches!(
        bind(&pool, None, &method, Some(&dog_receiver), &[]).unwrap_err(),
        ValueError::IllegalBinding { .. }
    ));
}

#[test]
fn dynamic_receivers_bind_locally_and_keep_the_native_this() {
    let pool = TypePool::new();
    let (_, dog) = animal_hierarchy(&pool);
    let instance = ObjectValue::new(&pool, None, dog).unwrap();
    let method = member_function(&instance.member("fetch").unwrap()).unwrap();

    let duck = ObjectValue::new_dynamic(&pool, None, DynamicConfig::default()).unwrap();
    let receiver = Value::Object(duck.clone());
    let rebound = bind(&pool, None, &method, Some(&receiver), &[]).unwrap();

    // The native receiver survives underneath the local binding.
    assert!(
        matches!(rebound.this().unwrap().deref(), Value::Object(o) if o.same_instance(&instance))
    );
    let local = rebound.bindings().get("this").cloned().unwrap();
    assert!(matches!(local.deref(), Value::Object(o) if o.same_instance(&duck)));
}

#[test]
fn static_methods_constructors_and_groups_refuse_binding() {
    let pool = TypePool::new();
    let (animal, _) = animal_hierarchy(&pool);

    let static_ty = pool.register_callable(
        CallableData::method("create", animal, vec![], TypeId::VOID).with_static(true),
    );
    let static_method = FuncValue::detached(&pool, None, static_ty, true).unwrap();
    assert!(bind(&pool, None, &static_method, None, &[]).is_err());

    let ctor_ty = pool.register_callable(CallableData::ctor(animal, vec![]));
    let ctor = FuncValue::detached(&pool, None, ctor_ty, true).unwrap();
    assert!(bind(&pool, None, &ctor, None, &[]).is_err());

    let m0 = pool.register_callable(CallableData::method("work", animal, vec![], TypeId::VOID));
    let group = FuncValue::method_group(
        &pool,
        None,
        vec![FuncValue::detached(&pool, None, m0, true).unwrap()],
    )
    .unwrap();
    assert!(bind(&pool, None, &group, None, &[]).is_err());
}

#[test]
fn hosted_methods_refuse_binding() {
    let pool = TypePool::new();
    let func = add_func(&pool);
    // The builtin bind member itself is hosted.
    let hosted = member_function(&func.member("bind").unwrap()).unwrap();
    assert!(matches!(
        bind(&pool, None, &hosted, None, &[]).unwrap_err(),
        ValueError::IllegalBinding { .. }
    ));
}

#[test]
fn generic_null_binds_to_reference_parameters_only() {
    let pool = TypePool::new();
    let (animal, _) = animal_hierarchy(&pool);
    let pet_ty = pool.register_callable(CallableData::function(
        "adopt",
        vec![Param::new("pet", animal)],
        TypeId::VOID,
    ));
    let adopt = FuncValue::global(&pool, None, pet_ty).unwrap();
    assert!(bind(&pool, None, &adopt, None, &[temp_generic_null()]).is_ok());

    let func = add_func(&pool);
    assert!(bind(&pool, None, &func, None, &[temp_generic_null()]).is_err());
}
