//! # heapscan - Heap Graph Introspection for Managed Runtimes
//!
//! heapscan measures and serializes the object graph of a live managed
//! runtime for offline analysis (leak hunting, footprint breakdowns, graph
//! walking).
//!
//! ## Overview
//!
//! - **Size Estimation**: Byte-accurate sizes for growable sequences, hashed
//!   sets, mappings with split tables, multi-width text and big integers,
//!   with override, self-report and structural fallbacks
//! - **Reference Scanning**: Direct references through the host's
//!   traversal capability, in native order
//! - **Streaming Output**: One newline-delimited JSON record per object,
//!   composed in a bounded scratch buffer and appended in a single call
//! - **Never Fails Mid-Dump**: Host failures degrade a field or a strategy,
//!   only sink and out-of-memory errors stop a session
//!
//! ## Quick Start
//!
//! ```rust
//! use heapscan::object::{Category, OwnedShape, SnapshotHeap, TypeDescriptor};
//! use heapscan::{ExclusionSet, GraphDumper, RecursionMode, ScanConfig};
//!
//! fn main() -> Result<(), heapscan::ScanError> {
//!     let mut heap = SnapshotHeap::new();
//!     let dict_ty = heap.define_type(TypeDescriptor::new("dict", Category::Generic, 48).container());
//!     let str_ty = heap.define_type(TypeDescriptor::new("str", Category::Text, 0));
//!
//!     let key = heap.insert(str_ty, OwnedShape::text("answer"));
//!     let dict = heap.insert(dict_ty, OwnedShape::Generic);
//!     heap.add_ref(dict, key);
//!
//!     let mut dumper = GraphDumper::new(&heap, Vec::new(), ScanConfig::default())?;
//!     dumper.dump_live_objects(&heap, &ExclusionSet::empty(), RecursionMode::Shallow);
//!
//!     let (out, stats) = dumper.finish()?;
//!     assert_eq!(stats.records_emitted, 2);
//!     for line in String::from_utf8_lossy(&out).lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      GraphDumper                          │
//! │                                                           │
//! │  ExclusionSet ──► DedupFilter ──► SizeEstimator           │
//! │                                       │                   │
//! │                                       ▼                   │
//! │                  RecordWriter ◄── JsonEscaper             │
//! │                       │                                   │
//! │                       ▼                                   │
//! │  reference scanner ──► refs ──► WriteSink                 │
//! └───────────────────────┬───────────────────────────────────┘
//!                         │ reads only
//! ┌───────────────────────▼───────────────────────────────────┐
//! │        HeapModel / LiveObjects (host runtime)             │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Preconditions
//!
//! The host graph must be frozen for the whole session: no mutation, no
//! collection, no managed allocation by the host capabilities.
//!
//! ## Modules
//!
//! - [`config`]: Runtime layout constants and session tuning
//! - [`dedup`]: Consecutive-duplicate memo and exclusion set
//! - [`dumper`]: Dump session and record composition
//! - [`error`]: Error types
//! - [`escape`]: Bounded JSON string escaping
//! - [`object`]: Host object model boundary and in-memory snapshot
//! - [`record`]: Reading dump lines back
//! - [`scanner`]: Direct reference enumeration
//! - [`sink`]: Append-only output sinks
//! - [`size`]: Size strategy chain and override registry
//! - [`stats`]: Session counters
//!
//! ## Limitations
//!
//! - **Cycles**: `dump` suppresses only immediately repeated objects; `Full`
//!   recursion over a cycle is cut off by the depth limit, not by a visited set
//! - **Layouts**: Size formulas are only as accurate as the `RuntimeLayout`
//!   supplied for the host build

// Core session
pub mod config;
pub mod dumper;
pub mod error;

// Measurement and traversal
pub mod dedup;
pub mod scanner;
pub mod size;

// Host boundary
pub mod object;

// Output
pub mod escape;
pub mod record;
pub mod sink;
pub mod stats;

// Re-export main types for convenience
pub use config::{ConfigError, RuntimeLayout, ScanConfig};
pub use dedup::{DedupFilter, ExclusionSet};
pub use dumper::{GraphDumper, RecursionMode};
pub use error::{CapabilityError, Result, ScanError};
pub use object::{HeapModel, LiveObjects, ObjectHandle};
pub use record::DumpRecord;
pub use sink::{IoSink, WriteSink};
pub use size::{SizeEstimator, SizeOverrides, SizeStrategy};
pub use stats::DumpStats;

/// heapscan version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Dump a single object with default configuration
///
/// Convenience wrapper for a one-object session without exclusions.
///
/// # Examples
///
/// ```rust
/// use heapscan::object::{Category, OwnedShape, SnapshotHeap, TypeDescriptor};
/// use heapscan::RecursionMode;
///
/// let mut heap = SnapshotHeap::new();
/// let bytes_ty = heap.define_type(TypeDescriptor::new("bytes", Category::Bytes, 33).with_item_size(1));
/// let blob = heap.insert(bytes_ty, OwnedShape::bytes(b"abc"));
///
/// let (out, _) = heapscan::dump_object(&heap, blob, Vec::new(), RecursionMode::None)?;
/// let line = String::from_utf8(out).unwrap();
/// assert!(line.contains("\"size\": 36"));
/// assert!(line.contains("\"value\": \"abc\""));
/// # Ok::<(), heapscan::ScanError>(())
/// ```
pub fn dump_object<M, S>(model: &M, obj: ObjectHandle, sink: S, mode: RecursionMode) -> Result<(S, DumpStats)>
where
    M: HeapModel + ?Sized,
    S: WriteSink,
{
    let mut dumper = GraphDumper::new(model, sink, ScanConfig::default())?;
    dumper.dump(obj, &ExclusionSet::empty(), mode);
    dumper.finish()
}
