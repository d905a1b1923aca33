//! Size Module - Best-effort byte size of an object
//!
//! The estimator walks an ordered strategy chain, first match wins:
//!
//! ```text
//!   ┌────────────────────┐ formula for the category?
//!   │ 1. Structural      │──────────────────────────────► size
//!   └─────────┬──────────┘
//!             │ no (and category not exact-by-fallback)
//!   ┌─────────▼──────────┐ registered for the type name?
//!   │ 2. Override        │──────────────────────────────► size
//!   └─────────┬──────────┘
//!             │ missing / failed / negative
//!   ┌─────────▼──────────┐ host reports its own size?
//!   │ 3. Self-reported   │──────────────────────────────► size
//!   └─────────┬──────────┘
//!             │ unsupported / failed / negative
//!   ┌─────────▼──────────┐
//!   │ 4. Fallback        │ basic + length * item_size ──► size
//!   └────────────────────┘
//! ```
//!
//! Every strategy adds the GC header exactly once when the object's type is
//! GC-tracked. Estimation never fails.

pub mod formulas;
pub mod overrides;

pub use overrides::{SizeOverrideFn, SizeOverrides};

use crate::config::RuntimeLayout;
use crate::object::{HeapModel, ObjectHandle, TypeDescriptor};

/// Strategy that resolved a size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeStrategy {
    /// Exact formula for the category
    Structural,
    /// Registered per-type override
    Override,
    /// Object's own size report
    SelfReported,
    /// Basic size plus inline items
    Fallback,
}

/// Size estimator for one runtime layout
#[derive(Debug, Clone, Default)]
pub struct SizeEstimator {
    layout: RuntimeLayout,
    overrides: SizeOverrides,
}

impl SizeEstimator {
    /// Create estimator with an empty override registry
    pub fn new(layout: RuntimeLayout) -> Self {
        Self {
            layout,
            overrides: SizeOverrides::new(),
        }
    }

    /// Create estimator reading from a shared override registry
    pub fn with_overrides(layout: RuntimeLayout, overrides: SizeOverrides) -> Self {
        Self { layout, overrides }
    }

    /// Runtime layout in use
    pub fn layout(&self) -> &RuntimeLayout {
        &self.layout
    }

    /// Override registry in use
    pub fn overrides(&self) -> &SizeOverrides {
        &self.overrides
    }

    /// Estimate the size of `obj` in bytes
    ///
    /// # Examples
    ///
    /// ```rust
    /// use heapscan::object::{Category, OwnedShape, SnapshotHeap, TypeDescriptor};
    /// use heapscan::size::SizeEstimator;
    /// use heapscan::RuntimeLayout;
    ///
    /// let mut heap = SnapshotHeap::new();
    /// let list_ty = heap.define_type(TypeDescriptor::new("list", Category::Sequence, 40).container());
    /// let list = heap.insert(list_ty, OwnedShape::Sequence { len: 2, allocated: 4 });
    ///
    /// let estimator = SizeEstimator::new(RuntimeLayout::lp64());
    /// // basic + 4 slots + GC header
    /// assert_eq!(estimator.estimate(&heap, list), 40 + 32 + 16);
    /// ```
    pub fn estimate<M: HeapModel + ?Sized>(&self, model: &M, obj: ObjectHandle) -> usize {
        self.estimate_with_strategy(model, obj).0
    }

    /// Estimate the size of `obj` and report which strategy resolved it
    pub fn estimate_with_strategy<M: HeapModel + ?Sized>(
        &self,
        model: &M,
        obj: ObjectHandle,
    ) -> (usize, SizeStrategy) {
        let descriptor = model.descriptor(obj);
        let gc_header = self.gc_header(descriptor);

        let shape = model.shape(obj);
        if let Some(size) = formulas::structural_size(&self.layout, descriptor, &shape) {
            return (size.saturating_add(gc_header), SizeStrategy::Structural);
        }

        if !descriptor.category.fallback_is_exact() {
            if let Some(size) = self.from_override(descriptor, obj) {
                return (size.saturating_add(gc_header), SizeStrategy::Override);
            }
            if let Some(size) = self.from_self_report(model, obj) {
                return (size.saturating_add(gc_header), SizeStrategy::SelfReported);
            }
        }

        let length = if descriptor.is_var_sized() {
            model.length(obj).unwrap_or_else(|err| {
                log::trace!("length of {} unavailable: {}", obj, err);
                0
            })
        } else {
            0
        };

        (
            formulas::fallback_size(descriptor, length).saturating_add(gc_header),
            SizeStrategy::Fallback,
        )
    }

    #[inline]
    fn gc_header(&self, descriptor: &TypeDescriptor) -> usize {
        if descriptor.gc_tracked {
            self.layout.gc_header_size
        } else {
            0
        }
    }

    fn from_override(&self, descriptor: &TypeDescriptor, obj: ObjectHandle) -> Option<usize> {
        let estimator = self.overrides.get(&descriptor.name)?;
        match estimator(obj) {
            Ok(size) => usize::try_from(size).ok().or_else(|| {
                log::trace!("override for {} returned {}, ignoring", descriptor.name, size);
                None
            }),
            Err(err) => {
                log::trace!("override for {} failed: {:#}", descriptor.name, err);
                None
            }
        }
    }

    fn from_self_report<M: HeapModel + ?Sized>(&self, model: &M, obj: ObjectHandle) -> Option<usize> {
        match model.reported_size(obj) {
            Ok(size) => usize::try_from(size).ok(),
            Err(err) => {
                if !err.is_unsupported() {
                    log::trace!("self-reported size of {} failed: {}", obj, err);
                }
                None
            }
        }
    }
}
