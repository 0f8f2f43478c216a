//! Partial application and `this` rebinding for function values.
//!
//! Binding never calls anything: it derives a new function value whose
//! callable type has the bound parameters folded away and whose binding
//! table carries the bound values, sealed and replicated into the
//! caller's area.

use quill_types::{CallableKind, Param, TypeId, TypeKind, TypePool};

use crate::errors::{ValueError, ValueResult};
use crate::memory::MemoryArea;
use crate::util;
use crate::value::{BindingTable, BuiltinKind, FuncValue, Value};

/// Derive a new function from `func` with `new_this` and leading
/// arguments bound.
#[tracing::instrument(level = "debug", skip_all)]
pub fn bind(
    pool: &TypePool,
    area: Option<&MemoryArea>,
    func: &FuncValue,
    new_this: Option<&Value>,
    args: &[Value],
) -> ValueResult<FuncValue> {
    let data = pool
        .callable_data(func.callable_type())
        .ok_or_else(|| ValueError::internal("function value over a non-callable type"))?;
    if data.hosted {
        return Err(ValueError::illegal_binding(
            "hosted functions cannot be rebound",
        ));
    }

    let mut bindings;
    let mut this = func.this();
    match data.kind {
        CallableKind::MethodGroup => {
            return Err(ValueError::illegal_binding(
                "a method group must be resolved to one overload before binding",
            ));
        }
        CallableKind::Ctor => {
            return Err(ValueError::illegal_binding("constructors cannot be bound"));
        }
        CallableKind::Method => {
            if data.is_static {
                return Err(ValueError::illegal_binding(
                    "static methods have no this to rebind",
                ));
            }
            bindings = func.bindings();
            if let Some(target) = new_this {
                let resolved = target.deref();
                let is_dynamic = matches!(
                    &resolved,
                    Value::Object(obj) if obj.builtin_kind() == BuiltinKind::Dynamic
                );
                if is_dynamic {
                    // Dynamic targets cannot satisfy the containing
                    // class, so this rides along as a local binding.
                    let local = util::replicate(pool, area, target)?;
                    local.seal();
                    bindings.insert("this", local);
                } else {
                    let containing = data.containing.ok_or_else(|| {
                        ValueError::internal("instance method without a containing class")
                    })?;
                    // Exactly the containing type; subtypes do not
                    // qualify.
                    if resolved.type_id(pool) != Some(containing) {
                        return Err(ValueError::illegal_binding(
                            "this target is not an instance of the declaring class",
                        ));
                    }
                    this = Some(resolved);
                }
            }
        }
        CallableKind::Function | CallableKind::Lambda => {
            bindings = func.bindings();
            if let Some(target) = new_this {
                let local = util::replicate(pool, area, target)?;
                local.seal();
                bindings.insert("this", local);
            }
        }
    }

    bind_args(pool, &data.params, &mut bindings, args, area)?;
    let bound = data
        .params
        .iter()
        .filter(|param| bindings.get(&param.name).is_some())
        .count();
    let callable = pool
        .bind_params(func.callable_type(), bound)
        .ok_or_else(|| ValueError::illegal_binding("more arguments than parameters"))?;
    FuncValue::with_state(
        pool,
        area,
        callable,
        this,
        bindings,
        func.display_form().map(str::to_string),
    )
}

fn bind_args(
    pool: &TypePool,
    params: &[Param],
    bindings: &mut BindingTable,
    args: &[Value],
    area: Option<&MemoryArea>,
) -> ValueResult<()> {
    let mut free = params
        .iter()
        .filter(|param| bindings.get(&param.name).is_none())
        .collect::<Vec<_>>()
        .into_iter();
    for arg in args {
        let Some(param) = free.next() else {
            return Err(ValueError::illegal_binding("more arguments than parameters"));
        };
        if !accepts(pool, arg, param.ty) {
            return Err(ValueError::IllegalBinding {
                reason: format!(
                    "argument for {} is not convertible to {}",
                    param.name,
                    pool.type_name(param.ty)
                ),
            });
        }
        let bound = util::replicate(pool, area, arg)?;
        bound.seal();
        bindings.insert(param.name.clone(), bound);
    }
    Ok(())
}

fn accepts(pool: &TypePool, arg: &Value, param: TypeId) -> bool {
    match arg.type_id(pool) {
        Some(ty) => pool.convertibility(ty, param).is_convertible(),
        // A generic null binds to any parameter that holds references.
        None => matches!(
            pool.kind(param),
            Some(TypeKind::Class | TypeKind::Array | TypeKind::Callable | TypeKind::Any)
        ),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
