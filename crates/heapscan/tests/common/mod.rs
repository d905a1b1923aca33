//! Test Utilities for the heapscan Test Suite
//!
//! Provides a snapshot heap pre-populated with a realistic 64-bit type table
//! and helpers that parse and check dump output strictly.
//!
//! ============================================================================
//! Every emitted line is parsed as JSON. A helper never skips a bad line.
//! ============================================================================

#![allow(dead_code)]

use heapscan::object::{
    Category, KeyTable, MappingShape, ObjectHandle, OwnedShape, SetTable, SnapshotHeap,
    TypeDescriptor, TypeKey,
};
use heapscan::record::{parse_dump, DumpRecord};
use heapscan::{ExclusionSet, GraphDumper, RecursionMode, ScanConfig};

/// GC header of the default layout
pub const GC_HEADER: usize = 16;

/// Digit bits of the default layout
pub const DIGIT_BITS: u32 = 30;

/// Record keys in wire order
pub const FIELD_ORDER: [&str; 7] = ["address", "type", "size", "name", "len", "value", "refs"];

/// ============================================================================
/// TYPE TABLE
/// ============================================================================

/// Type keys of the fixture runtime
pub struct TypeTable {
    pub list: TypeKey,
    pub tuple: TypeKey,
    pub dict: TypeKey,
    pub set: TypeKey,
    pub str: TypeKey,
    pub bytes: TypeKey,
    pub int: TypeKey,
    pub bool: TypeKey,
    pub none: TypeKey,
    pub module: TypeKey,
    pub function: TypeKey,
    pub type_: TypeKey,
    pub frame: TypeKey,
    pub object: TypeKey,
    pub cell: TypeKey,
}

/// ============================================================================
/// HEAP FIXTURE
/// ============================================================================

/// Snapshot heap with a 64-bit type table
pub struct HeapFixture {
    pub heap: SnapshotHeap,
    pub types: TypeTable,
}

impl HeapFixture {
    /// Create fixture with every type defined and no objects
    pub fn new() -> Self {
        let mut heap = SnapshotHeap::new();
        let types = TypeTable {
            list: heap.define_type(TypeDescriptor::new("list", Category::Sequence, 40).container()),
            tuple: heap.define_type(
                TypeDescriptor::new("tuple", Category::Tuple, 24)
                    .with_item_size(8)
                    .container(),
            ),
            dict: heap.define_type(TypeDescriptor::new("dict", Category::Mapping, 48).container()),
            set: heap.define_type(TypeDescriptor::new("set", Category::HashedSet, 200).container()),
            str: heap.define_type(TypeDescriptor::new("str", Category::Text, 0)),
            bytes: heap.define_type(TypeDescriptor::new("bytes", Category::Bytes, 33).with_item_size(1)),
            int: heap.define_type(TypeDescriptor::new("int", Category::BigInt, 24).with_item_size(4)),
            bool: heap.define_type(TypeDescriptor::new("bool", Category::Bool, 24).with_item_size(4)),
            none: heap.define_type(TypeDescriptor::new("NoneType", Category::NoneValue, 16)),
            module: heap.define_type(TypeDescriptor::new("module", Category::Module, 56).container()),
            function: heap
                .define_type(TypeDescriptor::new("function", Category::Function, 136).container()),
            type_: heap.define_type(TypeDescriptor::new("type", Category::TypeDef, 880).container()),
            frame: heap.define_type(TypeDescriptor::new("frame", Category::Frame, 64).container()),
            object: heap.define_type(TypeDescriptor::new("object", Category::Generic, 16)),
            // Traversable but never GC-tracked
            cell: heap.define_type(TypeDescriptor::new("cell", Category::Generic, 24).traversable()),
        };
        Self { heap, types }
    }

    pub fn text(&mut self, value: &str) -> ObjectHandle {
        self.heap.insert(self.types.str, OwnedShape::text(value))
    }

    pub fn bytes(&mut self, value: &[u8]) -> ObjectHandle {
        self.heap.insert(self.types.bytes, OwnedShape::bytes(value))
    }

    pub fn int(&mut self, value: i64) -> ObjectHandle {
        self.heap.insert(self.types.int, OwnedShape::int(value, DIGIT_BITS))
    }

    pub fn bool(&mut self, value: bool) -> ObjectHandle {
        self.heap.insert(self.types.bool, OwnedShape::Bool(value))
    }

    pub fn none(&mut self) -> ObjectHandle {
        self.heap.insert(self.types.none, OwnedShape::NoneValue)
    }

    /// List over `items` with `allocated` slots
    pub fn list(&mut self, items: &[ObjectHandle], allocated: usize) -> ObjectHandle {
        let list = self.heap.insert(
            self.types.list,
            OwnedShape::Sequence {
                len: items.len(),
                allocated,
            },
        );
        self.heap.set_refs(list, items.iter().copied());
        list
    }

    pub fn tuple(&mut self, items: &[ObjectHandle]) -> ObjectHandle {
        let tuple = self.heap.insert(self.types.tuple, OwnedShape::Tuple { len: items.len() });
        self.heap.set_refs(tuple, items.iter().copied());
        tuple
    }

    /// Combined-table dict owning its key table
    pub fn dict(&mut self, entries: &[(ObjectHandle, ObjectHandle)]) -> ObjectHandle {
        let dict = self.heap.insert(
            self.types.dict,
            OwnedShape::Mapping(MappingShape {
                len: entries.len(),
                split_slots: None,
                keys: KeyTable { owners: 1, bytes: 360 },
            }),
        );
        self.heap.set_refs(dict, entries.iter().flat_map(|&(k, v)| [k, v]));
        dict
    }

    /// Set with value-equality membership over `items`
    pub fn set(&mut self, items: &[ObjectHandle]) -> ObjectHandle {
        let table = if items.len() <= 5 {
            SetTable::Inline
        } else {
            SetTable::External {
                slots: (items.len() * 2).next_power_of_two(),
            }
        };
        let set = self.heap.insert(
            self.types.set,
            OwnedShape::HashedSet {
                len: items.len(),
                table,
            },
        );
        self.heap.set_refs(set, items.iter().copied());
        self.heap.set_members(set, items.iter().copied());
        set
    }

    pub fn module(&mut self, name: Option<&str>) -> ObjectHandle {
        self.heap.insert(
            self.types.module,
            OwnedShape::Module {
                name: name.map(str::to_string),
            },
        )
    }

    pub fn function(&mut self, name: &str) -> ObjectHandle {
        self.heap.insert(
            self.types.function,
            OwnedShape::Function {
                name: name.to_string(),
            },
        )
    }

    pub fn type_def(&mut self, name: &str, heap_type: bool) -> ObjectHandle {
        self.heap.insert(
            self.types.type_,
            OwnedShape::TypeDef {
                name: name.to_string(),
                heap_type,
            },
        )
    }

    pub fn frame(&mut self, routine: Option<&str>) -> ObjectHandle {
        self.heap.insert(
            self.types.frame,
            OwnedShape::Frame {
                routine: routine.map(str::to_string),
            },
        )
    }

    /// Plain leaf object without traversal
    pub fn object(&mut self) -> ObjectHandle {
        self.heap.insert(self.types.object, OwnedShape::Generic)
    }

    /// Traversable, untracked holder of `items`
    pub fn cell(&mut self, items: &[ObjectHandle]) -> ObjectHandle {
        let cell = self.heap.insert(self.types.cell, OwnedShape::Generic);
        self.heap.set_refs(cell, items.iter().copied());
        cell
    }

    /// Dump `root` with default config and parse the output
    pub fn dump(&self, root: ObjectHandle, mode: RecursionMode) -> Vec<DumpRecord> {
        self.dump_with(root, &ExclusionSet::empty(), mode, ScanConfig::default())
    }

    /// Dump `root` with the given exclusion and config
    pub fn dump_with(
        &self,
        root: ObjectHandle,
        exclusion: &ExclusionSet,
        mode: RecursionMode,
        config: ScanConfig,
    ) -> Vec<DumpRecord> {
        let mut dumper = GraphDumper::new(&self.heap, Vec::new(), config)
            .expect("default-derived config must be accepted");
        dumper.dump(root, exclusion, mode);
        let (out, _) = dumper.finish().expect("Vec sink never fails");
        parse_strict(&out)
    }
}

/// ============================================================================
/// OUTPUT CHECKS
/// ============================================================================

/// Address of a handle as it appears on the wire
pub fn addr(handle: ObjectHandle) -> u64 {
    handle.address() as u64
}

/// Addresses of `records` in emission order
pub fn addresses(records: &[DumpRecord]) -> Vec<u64> {
    records.iter().map(|record| record.address).collect()
}

/// Parse output, asserting every line is one newline-terminated JSON object
pub fn parse_strict(out: &[u8]) -> Vec<DumpRecord> {
    let text = std::str::from_utf8(out).expect("dump output must be UTF-8");
    assert!(
        text.is_empty() || text.ends_with('\n'),
        "dump output must end with a newline"
    );
    for line in text.lines() {
        assert_line_well_formed(line);
    }
    parse_dump(out).expect("every line must parse as a record")
}

/// Assert a line is valid JSON with fields in wire order
pub fn assert_line_well_formed(line: &str) {
    let value: serde_json::Value = serde_json::from_str(line)
        .unwrap_or_else(|err| panic!("line is not valid JSON ({}): {}", err, line));
    assert!(value.is_object(), "line is not a JSON object: {}", line);
    assert!(
        line.bytes().all(|b| b >= 0x20 && b < 0x7F),
        "line contains raw control or non-ASCII bytes: {:?}",
        line
    );

    let positions: Vec<usize> = FIELD_ORDER
        .iter()
        .filter_map(|key| line.find(&format!("\"{}\": ", key)))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "fields out of order: {}", line);
    assert!(line.ends_with("]}"), "refs must be the last field: {}", line);
}
