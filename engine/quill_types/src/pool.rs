//! The type pool: append-only storage for all runtime types.
//!
//! The pool pre-interns the builtin types at fixed indices (see
//! [`TypeId`]) and hands out new indices for classes, arrays, and
//! callables registered by the host. All lookups are by index; the pool
//! never removes an entry, so an id stays valid for the pool's lifetime.
//!
//! The pool is passed explicitly to every operation that needs type
//! information. There is no global instance.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::convert::{scalar_convertibility, Convertibility};
use crate::data::{
    BasicKind, CallableData, CallableKind, ClassData, MemberDecl, Param, TypeData, TypeKind,
};
use crate::member::MemberTable;
use crate::TypeId;

/// A borrowed view of a class entry. Derefs to [`ClassData`].
#[derive(Clone)]
pub struct ClassView(Arc<TypeData>);

impl Deref for ClassView {
    type Target = ClassData;

    fn deref(&self) -> &ClassData {
        match &*self.0 {
            TypeData::Class(data) => data,
            // Constructed only from a Class entry.
            _ => unreachable!("ClassView over non-class data"),
        }
    }
}

/// A borrowed view of a callable entry. Derefs to [`CallableData`].
#[derive(Clone)]
pub struct CallableView(Arc<TypeData>);

impl Deref for CallableView {
    type Target = CallableData;

    fn deref(&self) -> &CallableData {
        match &*self.0 {
            TypeData::Callable(data) => data,
            // Constructed only from a Callable entry.
            _ => unreachable!("CallableView over non-callable data"),
        }
    }
}

/// Append-only, thread-safe type storage.
pub struct TypePool {
    types: RwLock<Vec<Arc<TypeData>>>,
    /// element id -> array-of-element id
    array_cache: RwLock<FxHashMap<TypeId, TypeId>>,
    /// class name -> id, for host lookups
    by_name: RwLock<FxHashMap<String, TypeId>>,
    /// (class, is_static) -> flattened member table
    member_tables: RwLock<FxHashMap<(TypeId, bool), Arc<MemberTable>>>,
}

impl TypePool {
    /// Create a pool with all builtin types pre-interned.
    pub fn new() -> Self {
        let mut types: Vec<Arc<TypeData>> = vec![
            Arc::new(TypeData::Bool),
            Arc::new(TypeData::Byte),
            Arc::new(TypeData::Char),
            Arc::new(TypeData::Int),
            Arc::new(TypeData::Float),
            Arc::new(TypeData::Void),
            Arc::new(TypeData::Any),
            Arc::new(TypeData::Class(ClassData {
                name: "Object".into(),
                parent: None,
                members: Vec::new(),
                enum_literals: None,
                comparable: false,
            })),
            Arc::new(TypeData::Class(
                ClassData::new("String", TypeId::OBJECT)
                    // Sealed by the string constructor once the real
                    // length is written.
                    .with_members(vec![MemberDecl::field("length", TypeId::INT)])
                    .with_comparable(true),
            )),
            Arc::new(TypeData::Class(ClassData::new("Dynamic", TypeId::OBJECT))),
            // Placeholder; replaced below once its method types exist.
            Arc::new(TypeData::Class(ClassData::new("Function", TypeId::OBJECT))),
        ];
        // Reserved builtin range up to FIRST_DYNAMIC.
        while types.len() < TypeId::FIRST_DYNAMIC as usize {
            types.push(Arc::new(TypeData::Void));
        }

        // The Function class needs callable types for its own methods.
        let bind_ty = TypeId::from_raw(types.len() as u32);
        types.push(Arc::new(TypeData::Callable(
            CallableData::method(
                "bind",
                TypeId::FUNCTION,
                vec![Param::new("target", TypeId::ANY)],
                TypeId::FUNCTION,
            )
            .with_hosted(true),
        )));
        let invoke_ty = TypeId::from_raw(types.len() as u32);
        types.push(Arc::new(TypeData::Callable(
            CallableData::method(
                "invoke",
                TypeId::FUNCTION,
                vec![Param::new("args", TypeId::ANY)],
                TypeId::ANY,
            )
            .with_hosted(true),
        )));
        types[TypeId::FUNCTION.raw() as usize] = Arc::new(TypeData::Class(
            ClassData::new("Function", TypeId::OBJECT).with_members(vec![
                MemberDecl::method("bind", bind_ty),
                MemberDecl::method("invoke", invoke_ty),
            ]),
        ));

        let mut by_name = FxHashMap::default();
        for id in [
            TypeId::OBJECT,
            TypeId::STRING,
            TypeId::DYNAMIC,
            TypeId::FUNCTION,
        ] {
            if let TypeData::Class(data) = &*types[id.raw() as usize] {
                by_name.insert(data.name.clone(), id);
            }
        }

        Self {
            types: RwLock::new(types),
            array_cache: RwLock::new(FxHashMap::default()),
            by_name: RwLock::new(by_name),
            member_tables: RwLock::new(FxHashMap::default()),
        }
    }

    fn push(&self, data: TypeData) -> TypeId {
        let mut types = self.types.write();
        let id = TypeId::from_raw(types.len() as u32);
        types.push(Arc::new(data));
        id
    }

    /// Raw entry lookup.
    pub fn data(&self, id: TypeId) -> Option<Arc<TypeData>> {
        self.types.read().get(id.raw() as usize).cloned()
    }

    /// Coarse kind of an entry.
    pub fn kind(&self, id: TypeId) -> Option<TypeKind> {
        self.data(id).map(|data| data.kind())
    }

    /// Class view, if the id names a class.
    pub fn class_data(&self, id: TypeId) -> Option<ClassView> {
        let data = self.data(id)?;
        match &*data {
            TypeData::Class(_) => Some(ClassView(data)),
            _ => None,
        }
    }

    /// Callable view, if the id names a callable.
    pub fn callable_data(&self, id: TypeId) -> Option<CallableView> {
        let data = self.data(id)?;
        match &*data {
            TypeData::Callable(_) => Some(CallableView(data)),
            _ => None,
        }
    }

    /// Register a new class. Member declarations referencing other types
    /// must already be registered.
    pub fn register_class(&self, data: ClassData) -> TypeId {
        let name = data.name.clone();
        let id = self.push(TypeData::Class(data));
        self.by_name.write().insert(name.clone(), id);
        tracing::trace!(%name, ?id, "registered class");
        id
    }

    /// Register a new callable type.
    pub fn register_callable(&self, data: CallableData) -> TypeId {
        let id = self.push(TypeData::Callable(data));
        tracing::trace!(?id, "registered callable");
        id
    }

    /// Register a method group type bundling overload callables.
    /// Returns `None` when `overloads` is empty or names a non-callable.
    pub fn register_method_group(&self, overloads: Vec<TypeId>) -> Option<TypeId> {
        let first = self.callable_data(*overloads.first()?)?;
        let data = CallableData {
            kind: CallableKind::MethodGroup,
            name: first.name.clone(),
            params: Vec::new(),
            ret: TypeId::ANY,
            containing: first.containing,
            is_static: first.is_static,
            hosted: first.hosted,
            overloads,
        };
        Some(self.register_callable(data))
    }

    /// The array type over an element, interned so repeated requests
    /// return the same id.
    pub fn array_of(&self, element: TypeId) -> TypeId {
        if let Some(id) = self.array_cache.read().get(&element) {
            return *id;
        }
        let id = self.push(TypeData::Array { element });
        self.array_cache.write().insert(element, id);
        id
    }

    /// The element type of an array id.
    pub fn element_of(&self, array: TypeId) -> Option<TypeId> {
        match self.data(array).as_deref() {
            Some(TypeData::Array { element }) => Some(*element),
            _ => None,
        }
    }

    /// Look up a registered class by name.
    pub fn find_class(&self, name: &str) -> Option<TypeId> {
        self.by_name.read().get(name).copied()
    }

    /// Immediate supertype. Arrays and callables hang off `Object` and
    /// `Function` respectively.
    pub fn parent_of(&self, id: TypeId) -> Option<TypeId> {
        match self.data(id).as_deref() {
            Some(TypeData::Class(data)) => data.parent,
            Some(TypeData::Array { .. }) => Some(TypeId::OBJECT),
            Some(TypeData::Callable(_)) => Some(TypeId::FUNCTION),
            _ => None,
        }
    }

    /// Whether `sub` sits at or below `sup` in the hierarchy.
    pub fn is_derived_from(&self, sub: TypeId, sup: TypeId, include_identical: bool) -> bool {
        if sub == sup {
            return include_identical;
        }
        let mut cursor = self.parent_of(sub);
        while let Some(current) = cursor {
            if current == sup {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// Classify the conversion from one type to another.
    pub fn convertibility(&self, from: TypeId, to: TypeId) -> Convertibility {
        if from == to {
            return Convertibility::Equivalent;
        }
        // Untyped storage accepts everything; leaving it needs a cast.
        if to == TypeId::ANY {
            return Convertibility::Downgraded;
        }
        if from == TypeId::ANY {
            return Convertibility::Unsafe;
        }
        if let (Some(f), Some(t)) = (BasicKind::of(from), BasicKind::of(to)) {
            return scalar_convertibility(f, t);
        }
        // Scalars format into strings; strings parse into scalars. Both
        // only on explicit request.
        if from.is_basic() && to == TypeId::STRING {
            return Convertibility::Castable;
        }
        if from == TypeId::STRING && to.is_basic() {
            return Convertibility::Castable;
        }
        if self.is_derived_from(from, to, false) {
            return Convertibility::Downgraded;
        }
        if self.is_derived_from(to, from, false) {
            return Convertibility::Unsafe;
        }
        Convertibility::Unconvertible
    }

    /// The flattened member table for a class, cached per (class, static).
    pub fn member_table(&self, class: TypeId, is_static: bool) -> Arc<MemberTable> {
        if let Some(table) = self.member_tables.read().get(&(class, is_static)) {
            return Arc::clone(table);
        }
        let table = Arc::new(MemberTable::build(self, class, is_static));
        self.member_tables
            .write()
            .entry((class, is_static))
            .or_insert(table)
            .clone()
    }

    /// Render a callable's identity signature: name plus parameter type
    /// names. Method groups render their overloads joined by `|`.
    pub fn callable_signature(&self, callable: TypeId) -> String {
        let Some(data) = self.callable_data(callable) else {
            return String::new();
        };
        if data.kind == CallableKind::MethodGroup {
            let parts: Vec<String> = data
                .overloads
                .iter()
                .map(|ov| self.callable_signature(*ov))
                .collect();
            return parts.join("|");
        }
        let params: Vec<String> = data
            .params
            .iter()
            .map(|param| self.type_name(param.ty))
            .collect();
        format!("{}({})", data.name, params.join(","))
    }

    /// Derive the callable type left after folding out the first
    /// `bound` parameters. Returns `None` when `bound` exceeds the
    /// parameter count or the id is not a plain callable.
    pub fn bind_params(&self, callable: TypeId, bound: usize) -> Option<TypeId> {
        let data = self.callable_data(callable)?;
        if data.kind == CallableKind::MethodGroup || bound > data.params.len() {
            return None;
        }
        if bound == 0 {
            return Some(callable);
        }
        let reduced = CallableData {
            kind: data.kind,
            name: data.name.clone(),
            params: data.params[bound..].to_vec(),
            ret: data.ret,
            containing: data.containing,
            is_static: data.is_static,
            hosted: data.hosted,
            overloads: Vec::new(),
        };
        Some(self.register_callable(reduced))
    }

    /// Human-readable type name for diagnostics.
    pub fn type_name(&self, id: TypeId) -> String {
        match self.data(id).as_deref() {
            Some(TypeData::Bool) => "bool".into(),
            Some(TypeData::Byte) => "byte".into(),
            Some(TypeData::Char) => "char".into(),
            Some(TypeData::Int) => "int".into(),
            Some(TypeData::Float) => "float".into(),
            Some(TypeData::Void) => "void".into(),
            Some(TypeData::Any) => "any".into(),
            Some(TypeData::Class(data)) => data.name.clone(),
            Some(TypeData::Array { element }) => format!("{}[]", self.type_name(*element)),
            Some(TypeData::Callable(_)) => self.callable_signature(id),
            None => format!("<unknown type {}>", id.raw()),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
