//! Heap Model - Capabilities the host runtime exposes
//!
//! The core only ever reads through these traits. Optional capabilities
//! default to "unsupported", so a host implements exactly what its type
//! system offers.
//!
//! # Preconditions
//!
//! The host graph must stay frozen (collector paused, no mutation) for the
//! whole dump session. Implementations must not allocate managed objects
//! while answering these queries.

use crate::error::CapabilityError;
use crate::object::{ObjectHandle, ObjectShape, TypeDescriptor};
use std::ops::ControlFlow;

/// Read-only view of the host object graph
pub trait HeapModel {
    /// Type metadata of `obj`
    fn descriptor(&self, obj: ObjectHandle) -> &TypeDescriptor;

    /// Structural shape of `obj`
    fn shape(&self, obj: ObjectHandle) -> ObjectShape<'_>;

    /// Enumerate direct references of `obj` in native order
    ///
    /// Called only when the descriptor declares a traversal capability.
    /// Must stop as soon as `visit` returns `ControlFlow::Break`.
    fn traverse(
        &self,
        obj: ObjectHandle,
        visit: &mut dyn FnMut(ObjectHandle) -> ControlFlow<()>,
    ) -> Result<(), CapabilityError> {
        let _ = (obj, visit);
        Ok(())
    }

    /// Generic element count of `obj`
    fn length(&self, obj: ObjectHandle) -> Result<usize, CapabilityError> {
        let _ = obj;
        Err(CapabilityError::Unsupported("length"))
    }

    /// Object's own report of its size in bytes, without GC header
    fn reported_size(&self, obj: ObjectHandle) -> Result<i64, CapabilityError> {
        let _ = obj;
        Err(CapabilityError::Unsupported("reported_size"))
    }

    /// Value-equality membership of `item` in the collection `container`
    fn value_contains(
        &self,
        container: ObjectHandle,
        item: ObjectHandle,
    ) -> Result<bool, CapabilityError> {
        let _ = (container, item);
        Err(CapabilityError::Unsupported("value_contains"))
    }
}

/// Enumerator of every currently live object
///
/// Iteration order is the enumerator's own.
pub trait LiveObjects {
    /// Visit every live object once
    fn for_each_live(&self, visit: &mut dyn FnMut(ObjectHandle));
}
