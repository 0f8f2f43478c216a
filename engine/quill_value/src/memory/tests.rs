use super::*;
use crate::temp::temp_int;
use crate::value::IntValue;
use pretty_assertions::assert_eq;

#[test]
fn temp_values_are_unstored_but_live() {
    let value = temp_int(7);
    assert!(!value.is_stored());
    assert!(value.ensure_live().is_ok());
}

#[test]
fn allocate_takes_ownership_of_a_temp() {
    let area = MemoryArea::heap();
    let value = temp_int(7);
    area.allocate(&value).unwrap();
    assert!(value.is_stored());
    assert_eq!(area.allocate(&value), Err(ValueError::AlreadyStored));
}

#[test]
fn recycle_kills_every_owned_value() {
    let area = MemoryArea::frame();
    let a = Value::Int(IntValue::new(Some(&area), 1));
    let b = Value::Int(IntValue::new(Some(&area), 2));
    area.recycle();

    assert_eq!(a.ensure_live(), Err(ValueError::NotStored));
    assert_eq!(b.ensure_live(), Err(ValueError::NotStored));
    assert!(!a.is_stored());

    // A second recycle changes nothing.
    area.recycle();
    assert!(area.is_recycled());
}

#[test]
fn values_born_into_a_recycled_area_are_dead() {
    let area = MemoryArea::frame();
    area.recycle();
    let value = Value::Int(IntValue::new(Some(&area), 1));
    assert_eq!(value.ensure_live(), Err(ValueError::NotStored));
}

#[test]
fn reallocate_moves_between_areas() {
    let frame = MemoryArea::frame();
    let heap = MemoryArea::heap();
    let value = Value::Int(IntValue::new(Some(&frame), 9));

    heap.reallocate(&value).unwrap();
    // The frame no longer owns the value, so recycling it is harmless.
    frame.recycle();
    assert!(value.ensure_live().is_ok());

    // Reallocating into the current owner is a no-op.
    heap.reallocate(&value).unwrap();
    assert!(value.is_stored());
}

#[test]
fn allocating_void_is_a_no_op() {
    let area = MemoryArea::heap();
    area.allocate(&Value::Void).unwrap();
    area.recycle();
    assert!(Value::Void.ensure_live().is_ok());
}

#[test]
fn stack_frames_recycle_on_pop() {
    let stack = StackArea::new();
    let frame = stack.push_frame().unwrap();
    let local = Value::Int(IntValue::new(Some(&frame), 3));
    assert_eq!(stack.depth(), 1);
    assert!(stack.current_frame().unwrap().same_area(&frame));

    assert!(stack.pop_frame());
    assert_eq!(stack.depth(), 0);
    assert_eq!(local.ensure_live(), Err(ValueError::NotStored));
    assert!(!stack.pop_frame());
}

#[test]
fn stack_depth_limit_overflows() {
    let stack = StackArea::with_limit(2);
    stack.push_frame().unwrap();
    stack.push_frame().unwrap();
    assert_eq!(
        stack.push_frame().unwrap_err(),
        ValueError::StackOverflow { depth: 2 }
    );
    stack.pop_frame();
    assert!(stack.push_frame().is_ok());
}
