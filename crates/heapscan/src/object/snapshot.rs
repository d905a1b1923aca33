//! Snapshot Heap - In-memory frozen object graph
//!
//! `SnapshotHeap` implements [`HeapModel`] and [`LiveObjects`] over owned
//! data. Hosts that can export their graph once (or tests that need a
//! deterministic graph) build one with the builder methods below.
//!
//! # Example
//!
//! ```rust
//! use heapscan::object::{Category, SnapshotHeap, TypeDescriptor};
//! use heapscan::object::snapshot::OwnedShape;
//!
//! let mut heap = SnapshotHeap::new();
//! let list_ty = heap.define_type(TypeDescriptor::new("list", Category::Sequence, 40).container());
//! let str_ty = heap.define_type(TypeDescriptor::new("str", Category::Text, 0));
//!
//! let text = heap.insert(str_ty, OwnedShape::text("hello"));
//! let list = heap.insert(list_ty, OwnedShape::Sequence { len: 1, allocated: 4 });
//! heap.add_ref(list, text);
//!
//! assert_eq!(heap.len(), 2);
//! ```

use crate::error::CapabilityError;
use crate::object::{
    AuxBuffer, BigIntShape, Category, HeapModel, LiveObjects, MappingShape, ObjectHandle,
    ObjectShape, SetTable, TextData, TextEncoding, TextShape, TypeDescriptor,
};
use indexmap::IndexMap;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use std::ops::ControlFlow;

/// Descriptor reported for handles the snapshot does not know
static UNKNOWN_TYPE: TypeDescriptor = TypeDescriptor::new("<unknown>", Category::Generic, 0);

/// First address handed out by [`SnapshotHeap::insert`]
const BASE_ADDRESS: usize = 0x10_0000;

/// Address stride between inserted objects
const ADDRESS_STRIDE: usize = 0x40;

/// Key of a type defined in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(usize);

/// Owned character data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedTextData {
    Latin1(Vec<u8>),
    Ucs2(Vec<u16>),
    Ucs4(Vec<u32>),
}

impl OwnedTextData {
    fn view(&self) -> TextData<'_> {
        match self {
            OwnedTextData::Latin1(data) => TextData::Latin1(data),
            OwnedTextData::Ucs2(data) => TextData::Ucs2(data),
            OwnedTextData::Ucs4(data) => TextData::Ucs4(data),
        }
    }
}

/// Owned text object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedText {
    pub encoding: TextEncoding,
    pub len: usize,
    pub data: Option<OwnedTextData>,
    pub wide_cache: Option<AuxBuffer>,
    pub utf8_cache: Option<AuxBuffer>,
}

/// Owned counterpart of [`ObjectShape`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnedShape {
    Sequence { len: usize, allocated: usize },
    Tuple { len: usize },
    HashedSet { len: usize, table: SetTable },
    Mapping(MappingShape),
    Text(OwnedText),
    Bytes(Vec<u8>),
    BigInt { digits: Vec<u32>, negative: bool },
    Bool(bool),
    NoneValue,
    Module { name: Option<String> },
    Function { name: String },
    TypeDef { name: String, heap_type: bool },
    Frame { routine: Option<String> },
    Generic,
}

impl OwnedShape {
    /// Compact text in the narrowest width that holds every character
    pub fn text(value: &str) -> Self {
        let max = value.chars().map(u32::from).max().unwrap_or(0);
        let data = if max <= 0xFF {
            OwnedTextData::Latin1(value.chars().map(|c| u32::from(c) as u8).collect())
        } else if max <= 0xFFFF {
            OwnedTextData::Ucs2(value.chars().map(|c| u32::from(c) as u16).collect())
        } else {
            OwnedTextData::Ucs4(value.chars().map(u32::from).collect())
        };
        let shape = TextShape::compact(data.view(), value.is_ascii());
        OwnedShape::Text(OwnedText {
            encoding: shape.encoding,
            len: shape.len,
            data: Some(data),
            wide_cache: None,
            utf8_cache: None,
        })
    }

    /// Byte buffer
    pub fn bytes(value: &[u8]) -> Self {
        OwnedShape::Bytes(value.to_vec())
    }

    /// Integer split into little-endian digits of `digit_bits` bits
    pub fn int(value: i64, digit_bits: u32) -> Self {
        let mut magnitude = value.unsigned_abs();
        let mask = (1u64 << digit_bits) - 1;
        let mut digits = Vec::new();
        while magnitude != 0 {
            digits.push((magnitude & mask) as u32);
            magnitude >>= digit_bits;
        }
        OwnedShape::BigInt {
            digits,
            negative: value < 0,
        }
    }

    /// Borrowed view
    pub fn view(&self) -> ObjectShape<'_> {
        match self {
            OwnedShape::Sequence { len, allocated } => ObjectShape::Sequence {
                len: *len,
                allocated: *allocated,
            },
            OwnedShape::Tuple { len } => ObjectShape::Tuple { len: *len },
            OwnedShape::HashedSet { len, table } => ObjectShape::HashedSet {
                len: *len,
                table: *table,
            },
            OwnedShape::Mapping(mapping) => ObjectShape::Mapping(*mapping),
            OwnedShape::Text(text) => ObjectShape::Text(TextShape {
                encoding: text.encoding,
                len: text.len,
                data: text.data.as_ref().map(OwnedTextData::view),
                wide_cache: text.wide_cache,
                utf8_cache: text.utf8_cache,
            }),
            OwnedShape::Bytes(data) => ObjectShape::Bytes(data),
            OwnedShape::BigInt { digits, negative } => ObjectShape::BigInt(BigIntShape {
                digits,
                negative: *negative,
            }),
            OwnedShape::Bool(value) => ObjectShape::Bool(*value),
            OwnedShape::NoneValue => ObjectShape::NoneValue,
            OwnedShape::Module { name } => ObjectShape::Module {
                name: name.as_deref(),
            },
            OwnedShape::Function { name } => ObjectShape::Function { name },
            OwnedShape::TypeDef { name, heap_type } => ObjectShape::TypeDef {
                name,
                heap_type: *heap_type,
            },
            OwnedShape::Frame { routine } => ObjectShape::Frame {
                routine: routine.as_deref(),
            },
            OwnedShape::Generic => ObjectShape::Generic,
        }
    }
}

/// One object of the snapshot
#[derive(Debug, Clone)]
struct SnapshotObject {
    ty: TypeKey,
    shape: OwnedShape,
    refs: Vec<ObjectHandle>,
    length: Option<Result<usize, String>>,
    reported_size: Option<Result<i64, String>>,
    /// Traversal yields this many references, then fails
    traverse_fails_after: Option<usize>,
    members: Option<FxHashSet<ObjectHandle>>,
}

/// In-memory frozen object graph
#[derive(Debug)]
pub struct SnapshotHeap {
    types: Vec<TypeDescriptor>,
    objects: IndexMap<ObjectHandle, SnapshotObject, BuildHasherDefault<FxHasher>>,
    next_address: usize,
}

impl SnapshotHeap {
    /// Create empty snapshot
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            objects: IndexMap::default(),
            next_address: BASE_ADDRESS,
        }
    }

    /// Register a type
    pub fn define_type(&mut self, descriptor: TypeDescriptor) -> TypeKey {
        self.types.push(descriptor);
        TypeKey(self.types.len() - 1)
    }

    /// Descriptor of a registered type
    ///
    /// # Panics
    ///
    /// Panics if `ty` was not returned by this snapshot's `define_type`.
    pub fn type_descriptor(&self, ty: TypeKey) -> &TypeDescriptor {
        &self.types[ty.0]
    }

    /// Insert an object at the next free address
    pub fn insert(&mut self, ty: TypeKey, shape: OwnedShape) -> ObjectHandle {
        while self.objects.contains_key(&ObjectHandle::new(self.next_address)) {
            self.next_address += ADDRESS_STRIDE;
        }
        let handle = ObjectHandle::new(self.next_address);
        self.next_address += ADDRESS_STRIDE;
        self.insert_at(handle, ty, shape)
    }

    /// Insert an object at a chosen address, replacing any previous object there
    pub fn insert_at(&mut self, handle: ObjectHandle, ty: TypeKey, shape: OwnedShape) -> ObjectHandle {
        self.objects.insert(
            handle,
            SnapshotObject {
                ty,
                shape,
                refs: Vec::new(),
                length: None,
                reported_size: None,
                traverse_fails_after: None,
                members: None,
            },
        );
        handle
    }

    /// Append a direct reference `from -> to`
    pub fn add_ref(&mut self, from: ObjectHandle, to: ObjectHandle) {
        if let Some(object) = self.objects.get_mut(&from) {
            object.refs.push(to);
        }
    }

    /// Replace the direct references of `from`
    pub fn set_refs(&mut self, from: ObjectHandle, refs: impl IntoIterator<Item = ObjectHandle>) {
        if let Some(object) = self.objects.get_mut(&from) {
            object.refs = refs.into_iter().collect();
        }
    }

    /// Override the generic length capability
    pub fn set_length(&mut self, obj: ObjectHandle, length: Result<usize, String>) {
        if let Some(object) = self.objects.get_mut(&obj) {
            object.length = Some(length);
        }
    }

    /// Give the object a self-reported size capability
    pub fn set_reported_size(&mut self, obj: ObjectHandle, size: Result<i64, String>) {
        if let Some(object) = self.objects.get_mut(&obj) {
            object.reported_size = Some(size);
        }
    }

    /// Make traversal of `obj` fail after yielding `yielded` references
    pub fn fail_traversal_after(&mut self, obj: ObjectHandle, yielded: usize) {
        if let Some(object) = self.objects.get_mut(&obj) {
            object.traverse_fails_after = Some(yielded);
        }
    }

    /// Declare the collection members of `container` for `value_contains`
    pub fn set_members(&mut self, container: ObjectHandle, members: impl IntoIterator<Item = ObjectHandle>) {
        if let Some(object) = self.objects.get_mut(&container) {
            object.members = Some(members.into_iter().collect());
        }
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the snapshot holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All handles in insertion order
    pub fn handles(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.objects.keys().copied()
    }

    fn object(&self, obj: ObjectHandle) -> Option<&SnapshotObject> {
        self.objects.get(&obj)
    }
}

impl Default for SnapshotHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapModel for SnapshotHeap {
    fn descriptor(&self, obj: ObjectHandle) -> &TypeDescriptor {
        match self.object(obj) {
            Some(object) => &self.types[object.ty.0],
            None => &UNKNOWN_TYPE,
        }
    }

    fn shape(&self, obj: ObjectHandle) -> ObjectShape<'_> {
        self.object(obj)
            .map(|object| object.shape.view())
            .unwrap_or(ObjectShape::Generic)
    }

    fn traverse(
        &self,
        obj: ObjectHandle,
        visit: &mut dyn FnMut(ObjectHandle) -> ControlFlow<()>,
    ) -> Result<(), CapabilityError> {
        let Some(object) = self.object(obj) else {
            return Ok(());
        };

        for (index, &child) in object.refs.iter().enumerate() {
            if object.traverse_fails_after == Some(index) {
                return Err(CapabilityError::Failed(format!(
                    "traversal of {:#x} failed at reference {}",
                    obj, index
                )));
            }
            if visit(child).is_break() {
                return Ok(());
            }
        }

        match object.traverse_fails_after {
            Some(after) if after >= object.refs.len() => Err(CapabilityError::Failed(format!(
                "traversal of {:#x} failed after last reference",
                obj
            ))),
            _ => Ok(()),
        }
    }

    fn length(&self, obj: ObjectHandle) -> Result<usize, CapabilityError> {
        let object = self
            .object(obj)
            .ok_or(CapabilityError::Unsupported("length"))?;

        if let Some(length) = &object.length {
            return length.clone().map_err(CapabilityError::Failed);
        }

        match &object.shape {
            OwnedShape::Bytes(data) => Ok(data.len()),
            OwnedShape::Text(text) => Ok(text.len),
            other => other
                .view()
                .container_len()
                .ok_or(CapabilityError::Unsupported("length")),
        }
    }

    fn reported_size(&self, obj: ObjectHandle) -> Result<i64, CapabilityError> {
        match self.object(obj).and_then(|object| object.reported_size.as_ref()) {
            Some(size) => size.clone().map_err(CapabilityError::Failed),
            None => Err(CapabilityError::Unsupported("reported_size")),
        }
    }

    fn value_contains(
        &self,
        container: ObjectHandle,
        item: ObjectHandle,
    ) -> Result<bool, CapabilityError> {
        match self.object(container).and_then(|object| object.members.as_ref()) {
            Some(members) => Ok(members.contains(&item)),
            None => Err(CapabilityError::Unsupported("value_contains")),
        }
    }
}

impl LiveObjects for SnapshotHeap {
    /// Visits GC-tracked objects in insertion order
    fn for_each_live(&self, visit: &mut dyn FnMut(ObjectHandle)) {
        for (&handle, object) in &self.objects {
            if self.types[object.ty.0].gc_tracked {
                visit(handle);
            }
        }
    }
}
