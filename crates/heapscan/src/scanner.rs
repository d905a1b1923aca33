//! Reference Scanner - Enumerates direct references of an object
//!
//! Scanner is responsible for:
//! - Deciding whether an object may be traversed at all
//! - Calling the host traversal capability in native order
//! - Swallowing host failures (a failure stops the walk of that object)
//!
//! Built-in type definitions are never traversed, even when their type
//! declares the capability: their internals vary between runtime versions
//! and they are not part of the live-object set.

use crate::object::{HeapModel, ObjectHandle};
use std::ops::ControlFlow;

/// Check whether `obj` has a usable traversal capability
#[inline]
pub fn has_traversal<M: HeapModel + ?Sized>(model: &M, obj: ObjectHandle) -> bool {
    model.descriptor(obj).traversable && !model.shape(obj).is_static_type()
}

/// Visit every direct reference of `obj`
///
/// `visit` may return `ControlFlow::Break` to stop early. Returns the number
/// of references visited. Never fails: a host error ends the walk and the
/// references seen before it still count.
pub fn for_each_reference<M, F>(model: &M, obj: ObjectHandle, mut visit: F) -> usize
where
    M: HeapModel + ?Sized,
    F: FnMut(ObjectHandle) -> ControlFlow<()>,
{
    if !has_traversal(model, obj) {
        return 0;
    }

    let mut visited = 0usize;
    let result = model.traverse(obj, &mut |child| {
        visited += 1;
        visit(child)
    });

    if let Err(err) = result {
        log::trace!("traversal of {} stopped after {} refs: {}", obj, visited, err);
    }

    visited
}

/// Collect the direct references of `obj`
pub fn referents<M: HeapModel + ?Sized>(model: &M, obj: ObjectHandle) -> Vec<ObjectHandle> {
    let mut refs = Vec::new();
    for_each_reference(model, obj, |child| {
        refs.push(child);
        ControlFlow::Continue(())
    });
    refs
}
