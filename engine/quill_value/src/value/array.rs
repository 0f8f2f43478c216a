//! Array values.
//!
//! Arrays come in two storage shapes. Basic arrays store scalar
//! payloads contiguously in a native vector. Object arrays store one
//! value slot per element; a slot is a reference (or untyped box) that
//! starts as a typed null and is written through the assignment
//! protocol. Multi-dimensional arrays are arrays of arrays, built
//! recursively; a trailing undefined dimension leaves the inner slots
//! null for the host to fill.
//!
//! Two-phase construction goes through [`ArrayValueBuilder`]: fix the
//! length, fill every slot, then take the result. Taking an incomplete
//! array is a bug in the caller and panics.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use quill_types::{scalar_convertibility, BasicKind, Convertibility, TypeId, TypePool};

use crate::errors::{AssignResult, ValueError, ValueResult};
use crate::memory::{MemoryArea, StorageCell};
use crate::util;
use crate::value::scalar::Scalar;
use crate::value::Value;

/// One dimension of a multi-dimensional array request.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Dim {
    Fixed(usize),
    /// Length deferred; the containing slots stay null.
    Undefined,
}

/// Host-supplied ordering for object arrays whose elements the value
/// layer cannot order itself.
pub trait ValueComparer {
    fn compare(&self, a: &Value, b: &Value) -> ValueResult<CmpOrdering>;
}

#[derive(Debug)]
enum ArrayBody {
    Bool(RwLock<Vec<bool>>),
    Byte(RwLock<Vec<u8>>),
    Char(RwLock<Vec<char>>),
    Int(RwLock<Vec<i64>>),
    Float(RwLock<Vec<f64>>),
    Object(RwLock<Vec<Value>>),
}

#[derive(Debug)]
struct ArrayCore {
    array_type: TypeId,
    element: TypeId,
    body: ArrayBody,
    konst: AtomicBool,
    storage: StorageCell,
}

/// A one-dimensional array over a fixed element type.
#[derive(Clone, Debug)]
pub struct ArrayValue {
    core: Arc<ArrayCore>,
}

impl ArrayValue {
    /// A single-dimensional array, elements default-initialized.
    pub fn new(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        element: TypeId,
        len: usize,
    ) -> ValueResult<Self> {
        let body = match element {
            TypeId::BOOL => ArrayBody::Bool(RwLock::new(vec![false; len])),
            TypeId::BYTE => ArrayBody::Byte(RwLock::new(vec![0; len])),
            TypeId::CHAR => ArrayBody::Char(RwLock::new(vec!['\0'; len])),
            TypeId::INT => ArrayBody::Int(RwLock::new(vec![0; len])),
            TypeId::FLOAT => ArrayBody::Float(RwLock::new(vec![0.0; len])),
            _ => {
                let mut slots = Vec::with_capacity(len);
                for _ in 0..len {
                    slots.push(util::default_value(pool, area, element, false)?);
                }
                ArrayBody::Object(RwLock::new(slots))
            }
        };
        Ok(Self {
            core: Arc::new(ArrayCore {
                array_type: pool.array_of(element),
                element,
                body,
                konst: AtomicBool::new(false),
                storage: StorageCell::stored_in(area),
            }),
        })
    }

    /// A multi-dimensional array: `dims` are outermost first, over a
    /// base element type. The leading dimension must be fixed, and an
    /// undefined dimension may only be followed by undefined ones.
    pub fn new_multi(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        element: TypeId,
        dims: &[Dim],
    ) -> ValueResult<Self> {
        let mut defined_over = false;
        for dim in dims {
            match dim {
                Dim::Undefined => defined_over = true,
                Dim::Fixed(_) if defined_over => {
                    return Err(ValueError::argument("dims"));
                }
                Dim::Fixed(_) => {}
            }
        }
        Self::build_multi(pool, area, element, dims)
    }

    fn build_multi(
        pool: &TypePool,
        area: Option<&MemoryArea>,
        element: TypeId,
        dims: &[Dim],
    ) -> ValueResult<Self> {
        let Some((first, rest)) = dims.split_first() else {
            return Err(ValueError::argument("dims"));
        };
        let Dim::Fixed(len) = *first else {
            return Err(ValueError::argument("dims"));
        };
        let elem_ty = (0..rest.len()).fold(element, |ty, _| pool.array_of(ty));
        let this = Self::new(pool, area, elem_ty, len)?;
        if matches!(rest.first(), Some(Dim::Fixed(_))) {
            for index in 0..len {
                let inner = Self::build_multi(pool, area, element, rest)?;
                let slot = this.get(index)?;
                Value::Array(inner).assign_to(&slot, pool)?;
            }
        }
        Ok(this)
    }

    pub fn len(&self) -> usize {
        match &self.core.body {
            ArrayBody::Bool(v) => v.read().len(),
            ArrayBody::Byte(v) => v.read().len(),
            ArrayBody::Char(v) => v.read().len(),
            ArrayBody::Int(v) => v.read().len(),
            ArrayBody::Float(v) => v.read().len(),
            ArrayBody::Object(v) => v.read().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> TypeId {
        self.core.element
    }

    pub fn array_type(&self) -> TypeId {
        self.core.array_type
    }

    /// Whether elements live in native scalar storage.
    pub fn has_basic_storage(&self) -> bool {
        !matches!(self.core.body, ArrayBody::Object(_))
    }

    pub fn is_const(&self) -> bool {
        self.core.konst.load(Ordering::SeqCst)
    }

    pub fn seal(&self) {
        self.core.konst.store(true, Ordering::SeqCst);
    }

    pub(crate) fn storage(&self) -> &StorageCell {
        &self.core.storage
    }

    pub fn same_array(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    fn check_index(&self, index: usize) -> ValueResult<()> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::ArrayIndexOutOfRange {
                index: index as i64,
                max: len as i64 - 1,
            });
        }
        Ok(())
    }

    /// Read one element. Basic storage answers a temp scalar copy;
    /// object storage answers the slot handle itself, so writes through
    /// the handle land in the array.
    pub fn get(&self, index: usize) -> ValueResult<Value> {
        self.core.storage.ensure_live()?;
        self.check_index(index)?;
        Ok(match &self.core.body {
            ArrayBody::Bool(v) => Value::from_scalar(Scalar::Bool(v.read()[index]), None),
            ArrayBody::Byte(v) => Value::from_scalar(Scalar::Byte(v.read()[index]), None),
            ArrayBody::Char(v) => Value::from_scalar(Scalar::Char(v.read()[index]), None),
            ArrayBody::Int(v) => Value::from_scalar(Scalar::Int(v.read()[index]), None),
            ArrayBody::Float(v) => Value::from_scalar(Scalar::Float(v.read()[index]), None),
            ArrayBody::Object(v) => v.read()[index].clone(),
        })
    }

    /// Write one element through the assignment protocol.
    pub fn set(&self, pool: &TypePool, index: usize, value: &Value) -> ValueResult<AssignResult> {
        self.core.storage.ensure_live()?;
        if self.is_const() {
            return Err(ValueError::ConstViolation);
        }
        self.check_index(index)?;
        match &self.core.body {
            ArrayBody::Object(slots) => {
                let slot = slots.read()[index].clone();
                value.assign_to(&slot, pool)
            }
            _ => self.set_scalar(pool, index, value),
        }
    }

    fn set_scalar(&self, pool: &TypePool, index: usize, value: &Value) -> ValueResult<AssignResult> {
        let elem_kind = BasicKind::of(self.core.element)
            .ok_or_else(|| ValueError::internal("basic storage without basic element"))?;
        let Some(incoming) = value.deref().as_scalar() else {
            return Err(ValueError::illegal_assignment(
                value.type_name(pool),
                pool.type_name(self.core.element),
            ));
        };
        let conv = scalar_convertibility(incoming.kind(), elem_kind);
        let Some(converted) = incoming.convert_to(elem_kind) else {
            return Err(ValueError::illegal_assignment(
                incoming.kind().name(),
                elem_kind.name(),
            ));
        };
        match (&self.core.body, converted) {
            (ArrayBody::Bool(v), Scalar::Bool(x)) => v.write()[index] = x,
            (ArrayBody::Byte(v), Scalar::Byte(x)) => v.write()[index] = x,
            (ArrayBody::Char(v), Scalar::Char(x)) => v.write()[index] = x,
            (ArrayBody::Int(v), Scalar::Int(x)) => v.write()[index] = x,
            (ArrayBody::Float(v), Scalar::Float(x)) => v.write()[index] = x,
            _ => return Err(ValueError::internal("converted scalar does not fit storage")),
        }
        Ok(
            if matches!(
                conv,
                Convertibility::Equivalent | Convertibility::Promoted
            ) {
                AssignResult::Exact
            } else {
                AssignResult::Lossy
            },
        )
    }

    /// Assign one value into every element.
    pub fn fill(&self, pool: &TypePool, value: &Value) -> ValueResult<()> {
        for index in 0..self.len() {
            self.set(pool, index, value)?;
        }
        Ok(())
    }

    /// Snapshot of all elements, as [`Self::get`] would answer them.
    pub fn values(&self) -> ValueResult<Vec<Value>> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    /// Iterate a snapshot of the elements.
    pub fn iter(&self) -> ValueResult<std::vec::IntoIter<Value>> {
        Ok(self.values()?.into_iter())
    }

    /// Copy `count` elements between arrays; clamps the count to what
    /// both sides can hold and answers the number actually copied.
    /// Copying an array onto itself or with negative arguments is a
    /// caller error.
    pub fn copy(
        pool: &TypePool,
        src: &ArrayValue,
        src_offset: i64,
        dst: &ArrayValue,
        dst_offset: i64,
        count: i64,
    ) -> ValueResult<usize> {
        if src.same_array(dst) {
            return Err(ValueError::argument("dst"));
        }
        if src_offset < 0 {
            return Err(ValueError::argument("srcOffset"));
        }
        if dst_offset < 0 {
            return Err(ValueError::argument("dstOffset"));
        }
        if count < 0 {
            return Err(ValueError::argument("count"));
        }
        src.core.storage.ensure_live()?;
        dst.core.storage.ensure_live()?;
        if dst.is_const() {
            return Err(ValueError::ConstViolation);
        }
        if src.has_basic_storage() != dst.has_basic_storage()
            || (src.has_basic_storage() && src.core.element != dst.core.element)
        {
            return Err(ValueError::illegal_assignment(
                pool.type_name(src.core.array_type),
                pool.type_name(dst.core.array_type),
            ));
        }

        let src_offset = src_offset as usize;
        let dst_offset = dst_offset as usize;
        let available_src = src.len().saturating_sub(src_offset);
        let available_dst = dst.len().saturating_sub(dst_offset);
        let count = (count as usize).min(available_src).min(available_dst);
        if count == 0 {
            return Ok(0);
        }

        match (&src.core.body, &dst.core.body) {
            (ArrayBody::Bool(s), ArrayBody::Bool(d)) => {
                d.write()[dst_offset..dst_offset + count]
                    .copy_from_slice(&s.read()[src_offset..src_offset + count]);
            }
            (ArrayBody::Byte(s), ArrayBody::Byte(d)) => {
                d.write()[dst_offset..dst_offset + count]
                    .copy_from_slice(&s.read()[src_offset..src_offset + count]);
            }
            (ArrayBody::Char(s), ArrayBody::Char(d)) => {
                d.write()[dst_offset..dst_offset + count]
                    .copy_from_slice(&s.read()[src_offset..src_offset + count]);
            }
            (ArrayBody::Int(s), ArrayBody::Int(d)) => {
                d.write()[dst_offset..dst_offset + count]
                    .copy_from_slice(&s.read()[src_offset..src_offset + count]);
            }
            (ArrayBody::Float(s), ArrayBody::Float(d)) => {
                d.write()[dst_offset..dst_offset + count]
                    .copy_from_slice(&s.read()[src_offset..src_offset + count]);
            }
            (ArrayBody::Object(_), ArrayBody::Object(_)) => {
                for offset in 0..count {
                    let value = src.get(src_offset + offset)?;
                    let slot = dst.get(dst_offset + offset)?;
                    value.assign_to(&slot, pool)?;
                }
            }
            _ => return Err(ValueError::internal("mismatched array bodies after check")),
        }
        Ok(count)
    }

    /// Sort in place. Basic arrays order natively (floats by total
    /// order, so NaN sorts last ascending; bools by a counting
    /// partition). Object arrays order strings by content and otherwise
    /// require a host comparer. Nulls group first ascending.
    pub fn sort(
        &self,
        pool: &TypePool,
        descending: bool,
        comparer: Option<&dyn ValueComparer>,
    ) -> ValueResult<()> {
        self.core.storage.ensure_live()?;
        if self.is_const() {
            return Err(ValueError::ConstViolation);
        }
        match &self.core.body {
            ArrayBody::Bool(v) => {
                let mut items = v.write();
                let trues = items.iter().filter(|x| **x).count();
                let falses = items.len() - trues;
                let (first, first_len) = if descending {
                    (true, trues)
                } else {
                    (false, falses)
                };
                for (index, item) in items.iter_mut().enumerate() {
                    *item = if index < first_len { first } else { !first };
                }
            }
            ArrayBody::Byte(v) => sort_native(&mut v.write(), descending),
            ArrayBody::Char(v) => sort_native(&mut v.write(), descending),
            ArrayBody::Int(v) => sort_native(&mut v.write(), descending),
            ArrayBody::Float(v) => {
                let mut items = v.write();
                items.sort_unstable_by(|a, b| a.total_cmp(b));
                if descending {
                    items.reverse();
                }
            }
            ArrayBody::Object(_) => self.sort_objects(pool, descending, comparer)?,
        }
        Ok(())
    }

    fn sort_objects(
        &self,
        pool: &TypePool,
        descending: bool,
        comparer: Option<&dyn ValueComparer>,
    ) -> ValueResult<()> {
        let ArrayBody::Object(slots) = &self.core.body else {
            return Err(ValueError::internal("object sort over basic storage"));
        };
        let mut items = slots.write();

        // Strings order by content without host help.
        let mut keys: Vec<Option<String>> = Vec::with_capacity(items.len());
        let mut all_strings = true;
        for slot in items.iter() {
            match slot.deref() {
                Value::Object(obj) => match obj.as_str() {
                    Some(text) => keys.push(Some(text)),
                    None => {
                        all_strings = false;
                        break;
                    }
                },
                Value::Reference(r) if r.is_null() => keys.push(None),
                _ => {
                    all_strings = false;
                    break;
                }
            }
        }
        if all_strings {
            let mut paired: Vec<(Option<String>, Value)> =
                keys.into_iter().zip(items.iter().cloned()).collect();
            paired.sort_by(|a, b| a.0.cmp(&b.0));
            if descending {
                paired.reverse();
            }
            for (slot, (_, value)) in items.iter_mut().zip(paired) {
                *slot = value;
            }
            return Ok(());
        }

        let comparer = comparer.ok_or_else(|| ValueError::argument("comparer"))?;
        let mut error: Option<ValueError> = None;
        items.sort_by(|a, b| {
            if error.is_some() {
                return CmpOrdering::Equal;
            }
            match comparer.compare(a, b) {
                Ok(ordering) => ordering,
                Err(err) => {
                    error = Some(err);
                    CmpOrdering::Equal
                }
            }
        });
        if let Some(err) = error {
            return Err(err);
        }
        if descending {
            items.reverse();
        }
        Ok(())
    }
}

fn sort_native<T: Ord + Copy>(items: &mut [T], descending: bool) {
    items.sort_unstable();
    if descending {
        items.reverse();
    }
}

/// Two-phase array construction: length first, then every slot, then
/// the sealed result.
pub struct ArrayValueBuilder {
    element: TypeId,
    area: Option<MemoryArea>,
    value: Option<ArrayValue>,
    filled: Vec<bool>,
}

impl ArrayValueBuilder {
    pub fn new(element: TypeId, area: Option<&MemoryArea>) -> Self {
        Self {
            element,
            area: area.cloned(),
            value: None,
            filled: Vec::new(),
        }
    }

    /// Fix the length. Callable exactly once.
    pub fn set_length(&mut self, pool: &TypePool, len: usize) -> ValueResult<()> {
        if self.value.is_some() {
            return Err(ValueError::internal("array builder length already set"));
        }
        self.value = Some(ArrayValue::new(pool, self.area.as_ref(), self.element, len)?);
        self.filled = vec![false; len];
        Ok(())
    }

    /// Fill one slot. The length must be fixed first.
    pub fn set_value(&mut self, pool: &TypePool, index: usize, value: &Value) -> ValueResult<()> {
        let Some(array) = &self.value else {
            return Err(ValueError::internal("array builder has no length"));
        };
        array.set(pool, index, value)?;
        self.filled[index] = true;
        Ok(())
    }

    /// Take the finished array.
    ///
    /// # Panics
    /// Panics when the length was never set or any slot was left
    /// unfilled; an incomplete array is a caller bug, not a runtime
    /// condition.
    pub fn get_result(self) -> ArrayValue {
        let Some(array) = self.value else {
            panic!("incomplete array: length was never set");
        };
        if let Some(missing) = self.filled.iter().position(|filled| !filled) {
            panic!("incomplete array: slot {missing} was never filled");
        }
        array
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
