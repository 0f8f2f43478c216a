use super::*;
use crate::data::{Accessibility, CallableData, ClassData, Param};
use crate::pool::TypePool;
use pretty_assertions::assert_eq;

/// Three-level hierarchy with overrides, an overload, and private fields:
///
/// ```text
/// Grandparent: speak(), speak(int), tag (private), secret (private)
/// Parent:      speak() [override], tag (public)
/// Child:       speak(int) [override]
/// ```
fn hierarchy(pool: &TypePool) -> (TypeId, TypeId, TypeId) {
    let g_speak0 = pool.register_callable(CallableData::method(
        "speak",
        TypeId::OBJECT,
        vec![],
        TypeId::VOID,
    ));
    let g_speak1 = pool.register_callable(CallableData::method(
        "speak",
        TypeId::OBJECT,
        vec![Param::new("n", TypeId::INT)],
        TypeId::VOID,
    ));
    let grandparent = pool.register_class(ClassData::new("Grandparent", TypeId::OBJECT).with_members(vec![
        MemberDecl::method("speak", g_speak0),
        MemberDecl::method("speak", g_speak1),
        MemberDecl::field("tag", TypeId::INT).with_access(Accessibility::Private),
        MemberDecl::field("secret", TypeId::INT).with_access(Accessibility::Private),
    ]));

    let p_speak0 = pool.register_callable(CallableData::method(
        "speak",
        grandparent,
        vec![],
        TypeId::VOID,
    ));
    let parent = pool.register_class(ClassData::new("Parent", grandparent).with_members(vec![
        MemberDecl::method("speak", p_speak0),
        MemberDecl::field("tag", TypeId::INT),
    ]));

    let c_speak1 = pool.register_callable(CallableData::method(
        "speak",
        parent,
        vec![Param::new("n", TypeId::INT)],
        TypeId::VOID,
    ));
    let child = pool.register_class(
        ClassData::new("Child", parent).with_members(vec![MemberDecl::method("speak", c_speak1)]),
    );
    (grandparent, parent, child)
}

#[test]
fn ranks_run_from_leaf_to_root() {
    let pool = TypePool::new();
    let (grandparent, parent, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);

    assert_eq!(table.rank_count(), 4);
    assert_eq!(table.class_at(0), Some(child));
    assert_eq!(table.class_at(1), Some(parent));
    assert_eq!(table.class_at(2), Some(grandparent));
    assert_eq!(table.class_at(3), Some(TypeId::OBJECT));
    assert_eq!(table.rank_of(parent), Some(1));
    assert_eq!(table.rank_of(TypeId::FUNCTION), None);
}

#[test]
fn override_shadows_ancestor_per_signature() {
    let pool = TypePool::new();
    let (_, _, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);

    let loaded = table.loaded_by_name(&pool, "speak", 0, false);
    assert_eq!(loaded.len(), 2);

    // speak(int) resolves to the child's override, speak() to the parent's.
    let by_sig: Vec<(String, usize)> = loaded
        .iter()
        .map(|m| (member_signature(&pool, &m.decl), m.rank))
        .collect();
    assert!(by_sig.contains(&("speak(int)".into(), 0)));
    assert!(by_sig.contains(&("speak()".into(), 1)));
}

#[test]
fn anchoring_above_the_leaf_hides_subclass_overrides() {
    let pool = TypePool::new();
    let (_, parent, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);
    let parent_rank = table.rank_of(parent).unwrap();

    let loaded = table.loaded_by_name(&pool, "speak", parent_rank, false);
    assert_eq!(loaded.len(), 2);
    let by_sig: Vec<(String, usize)> = loaded
        .iter()
        .map(|m| (member_signature(&pool, &m.decl), m.rank))
        .collect();
    // The child's speak(int) override at rank 0 is out of view; the
    // grandparent's original answers instead.
    assert!(by_sig.contains(&("speak(int)".into(), 2)));
    assert!(by_sig.contains(&("speak()".into(), 1)));
}

#[test]
fn private_ancestors_are_excluded_unless_requested() {
    let pool = TypePool::new();
    let (grandparent, _, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);

    assert!(table.loaded_by_name(&pool, "secret", 0, false).is_empty());

    let with_hidden = table.loaded_by_name(&pool, "secret", 0, true);
    assert_eq!(with_hidden.len(), 1);
    assert_eq!(with_hidden[0].rank, table.rank_of(grandparent).unwrap());

    // Anchored at the declaring class, private members are visible.
    let own_rank = table.rank_of(grandparent).unwrap();
    let own = table.loaded_by_name(&pool, "secret", own_rank, false);
    assert_eq!(own.len(), 1);
}

#[test]
fn field_redeclaration_shadows_private_ancestor_field() {
    let pool = TypePool::new();
    let (_, parent, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);

    let loaded = table.loaded_by_name(&pool, "tag", 0, false);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].rank, table.rank_of(parent).unwrap());
    assert_eq!(loaded[0].decl.access, Accessibility::Public);
}

#[test]
fn static_and_instance_tables_are_disjoint() {
    let pool = TypePool::new();
    let counter_ty = pool.register_callable(CallableData::method(
        "next",
        TypeId::OBJECT,
        vec![],
        TypeId::INT,
    ));
    let class = pool.register_class(ClassData::new("Counter", TypeId::OBJECT).with_members(vec![
        MemberDecl::field("count", TypeId::INT).with_static(true),
        MemberDecl::method("next", counter_ty),
    ]));

    let statics = pool.member_table(class, true);
    let instance = pool.member_table(class, false);
    assert!(statics.declares("count"));
    assert!(!statics.declares("next"));
    assert!(instance.declares("next"));
    assert!(!instance.declares("count"));
}

#[test]
fn missing_name_resolves_to_nothing() {
    let pool = TypePool::new();
    let (_, _, child) = hierarchy(&pool);
    let table = pool.member_table(child, false);
    assert!(table.loaded_by_name(&pool, "nope", 0, false).is_empty());
    assert!(!table.declares("nope"));
}
