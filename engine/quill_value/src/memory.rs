//! Memory areas and storage liveness.
//!
//! Values do not own their lifetime; a [`MemoryArea`] does. A value is
//! created into an area (or left as a short-lived temp with no area) and
//! every state-touching operation first checks that its backing area is
//! still live. Recycling an area flips a shared liveness flag for every
//! value it owns, so stale handles fail fast with `NotStored` instead of
//! observing freed storage.
//!
//! [`StackArea`] stacks frame areas for call-scoped storage with a depth
//! limit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::errors::{ValueError, ValueResult};
use crate::value::Value;

/// Maximum call depth a [`StackArea`] accepts before erroring.
pub const STACK_DEPTH_LIMIT: usize = 200;

/// What scope a memory area models.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AreaKind {
    /// Long-lived storage; recycled only when the runtime shuts down.
    Heap,
    /// Call-frame storage; recycled when the frame pops.
    Frame,
}

#[derive(Debug)]
struct AreaInner {
    kind: AreaKind,
    /// Liveness flags of every value this area owns.
    slots: Mutex<Vec<Arc<AtomicBool>>>,
    recycled: AtomicBool,
}

/// A region of value storage with a single recycle point.
#[derive(Clone, Debug)]
pub struct MemoryArea {
    inner: Arc<AreaInner>,
}

impl MemoryArea {
    pub fn heap() -> Self {
        Self::with_kind(AreaKind::Heap)
    }

    pub fn frame() -> Self {
        Self::with_kind(AreaKind::Frame)
    }

    fn with_kind(kind: AreaKind) -> Self {
        Self {
            inner: Arc::new(AreaInner {
                kind,
                slots: Mutex::new(Vec::new()),
                recycled: AtomicBool::new(false),
            }),
        }
    }

    pub fn kind(&self) -> AreaKind {
        self.inner.kind
    }

    pub fn is_recycled(&self) -> bool {
        self.inner.recycled.load(Ordering::SeqCst)
    }

    /// Two handles to the same underlying area compare equal.
    pub fn same_area(&self, other: &MemoryArea) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Take ownership of a temp value. Errors with `AlreadyStored` when
    /// the value is still owned by a live area.
    pub fn allocate(&self, value: &Value) -> ValueResult<()> {
        let Some(cell) = value.storage_cell() else {
            // Void carries no storage.
            return Ok(());
        };
        if cell.is_stored() {
            return Err(ValueError::AlreadyStored);
        }
        cell.attach(self.adopt());
        Ok(())
    }

    /// Move a value into this area, releasing it from its current owner.
    /// Used when a resizable value (string, array) outgrows frame scope.
    /// A no-op when this area already owns the value.
    pub fn reallocate(&self, value: &Value) -> ValueResult<()> {
        let Some(cell) = value.storage_cell() else {
            return Ok(());
        };
        if cell.owned_by(self) {
            return Ok(());
        }
        cell.attach(self.adopt());
        Ok(())
    }

    /// Register a fresh liveness flag in this area. Values born into a
    /// recycled area are dead on arrival.
    pub(crate) fn adopt(&self) -> StorageHandle {
        let alive = Arc::new(AtomicBool::new(!self.is_recycled()));
        if !self.is_recycled() {
            self.inner.slots.lock().push(Arc::clone(&alive));
        }
        StorageHandle {
            area: Arc::downgrade(&self.inner),
            alive,
        }
    }

    /// Kill every value this area owns. Idempotent.
    pub fn recycle(&self) {
        if self.inner.recycled.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut slots = self.inner.slots.lock();
        tracing::trace!(kind = ?self.inner.kind, values = slots.len(), "recycling memory area");
        for flag in slots.iter() {
            flag.store(false, Ordering::SeqCst);
        }
        slots.clear();
    }
}

/// A value's link back to its owning area.
#[derive(Debug)]
pub(crate) struct StorageHandle {
    area: Weak<AreaInner>,
    alive: Arc<AtomicBool>,
}

impl StorageHandle {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Per-value storage slot: either unattached (a temp value) or holding
/// a handle into the owning area.
#[derive(Debug)]
pub(crate) struct StorageCell {
    handle: Mutex<Option<StorageHandle>>,
}

impl StorageCell {
    /// A cell for a temp value, owned by no area.
    pub(crate) fn unstored() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// A cell born into an area.
    pub(crate) fn stored_in(area: Option<&MemoryArea>) -> Self {
        match area {
            Some(area) => Self {
                handle: Mutex::new(Some(area.adopt())),
            },
            None => Self::unstored(),
        }
    }

    pub(crate) fn attach(&self, handle: StorageHandle) {
        *self.handle.lock() = Some(handle);
    }

    /// Whether a live area currently owns this value.
    pub(crate) fn is_stored(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(StorageHandle::is_alive)
    }

    /// Temp values pass; stored values pass only while the owning area
    /// is live.
    pub(crate) fn ensure_live(&self) -> ValueResult<()> {
        match self.handle.lock().as_ref() {
            Some(handle) if !handle.is_alive() => Err(ValueError::NotStored),
            _ => Ok(()),
        }
    }

    /// The live area owning this value, if any.
    pub(crate) fn owner_area(&self) -> Option<MemoryArea> {
        self.handle.lock().as_ref().and_then(|handle| {
            if handle.is_alive() {
                handle.area.upgrade().map(|inner| MemoryArea { inner })
            } else {
                None
            }
        })
    }

    pub(crate) fn owned_by(&self, area: &MemoryArea) -> bool {
        self.handle.lock().as_ref().is_some_and(|handle| {
            handle.is_alive()
                && handle
                    .area
                    .upgrade()
                    .is_some_and(|inner| Arc::ptr_eq(&inner, &area.inner))
        })
    }
}

/// A stack of frame areas with a depth limit.
pub struct StackArea {
    frames: Mutex<Vec<MemoryArea>>,
    limit: usize,
}

impl StackArea {
    pub fn new() -> Self {
        Self::with_limit(STACK_DEPTH_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            limit,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    /// Push a fresh frame, handing back its area.
    pub fn push_frame(&self) -> ValueResult<MemoryArea> {
        let mut frames = self.frames.lock();
        if frames.len() >= self.limit {
            return Err(ValueError::StackOverflow { depth: self.limit });
        }
        let frame = MemoryArea::frame();
        frames.push(frame.clone());
        Ok(frame)
    }

    /// Pop and recycle the top frame. Returns whether a frame existed.
    pub fn pop_frame(&self) -> bool {
        let frame = self.frames.lock().pop();
        match frame {
            Some(frame) => {
                frame.recycle();
                true
            }
            None => false,
        }
    }

    /// The area of the innermost frame.
    pub fn current_frame(&self) -> Option<MemoryArea> {
        self.frames.lock().last().cloned()
    }
}

impl Default for StackArea {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;
