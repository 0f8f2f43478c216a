//! Shared builders for value-layer tests.

use quill_types::{CallableData, ClassData, MemberDecl, Param, TypeId, TypePool};

/// `Animal <- Dog`, each level with one field and one method.
pub(crate) fn animal_hierarchy(pool: &TypePool) -> (TypeId, TypeId) {
    let speak = pool.register_callable(CallableData::method(
        "speak",
        TypeId::OBJECT,
        vec![],
        TypeId::STRING,
    ));
    let animal = pool.register_class(ClassData::new("Animal", TypeId::OBJECT).with_members(vec![
        MemberDecl::field("legs", TypeId::INT),
        MemberDecl::method("speak", speak),
    ]));
    let fetch = pool.register_callable(CallableData::method(
        "fetch",
        animal,
        vec![Param::new("times", TypeId::INT)],
        TypeId::VOID,
    ));
    let dog = pool.register_class(ClassData::new("Dog", animal).with_members(vec![
        MemberDecl::field("goodness", TypeId::FLOAT),
        MemberDecl::method("fetch", fetch),
    ]));
    (animal, dog)
}

/// A three-constant enum class.
pub(crate) fn color_enum(pool: &TypePool) -> TypeId {
    pool.register_class(
        ClassData::new("Color", TypeId::OBJECT)
            .with_enum_literals(vec!["RED".into(), "GREEN".into(), "BLUE".into()]),
    )
}
