//! Object Module - Host object model boundary
//!
//! heapscan never owns the objects it measures. This module defines the
//! read-only view the host runtime exposes: identities, per-type metadata,
//! per-object structural shapes and the optional capabilities (traversal,
//! length, self-reported size, containment).

pub mod descriptor;
pub mod handle;
pub mod model;
pub mod shape;
pub mod snapshot;

pub use descriptor::{Category, TypeDescriptor};
pub use handle::ObjectHandle;
pub use model::{HeapModel, LiveObjects};
pub use shape::{
    AuxBuffer, BigIntShape, CharWidth, KeyTable, MappingShape, ObjectShape, SetTable, TextData,
    TextEncoding, TextShape,
};
pub use snapshot::{OwnedShape, OwnedText, OwnedTextData, SnapshotHeap, TypeKey};
