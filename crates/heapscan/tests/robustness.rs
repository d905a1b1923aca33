//! Robustness Tests - Degradation Under Host and Sink Failures
//!
//! These tests verify:
//! - Sink errors stop the session and surface from `finish()`
//! - Host capability failures degrade single fields, never the record
//! - Escape overflow drops optional fields and truncates type names
//! - Scratch buffer sizing does not change the output
//!
//! ============================================================================
//! A SESSION NEVER EMITS A PARTIAL OR MALFORMED LINE
//! ============================================================================

mod common;

use common::{addr, addresses, parse_strict, HeapFixture};
use heapscan::object::{Category, ObjectHandle, OwnedShape, TypeDescriptor};
use heapscan::sink::IoSink;
use heapscan::{ExclusionSet, GraphDumper, RecursionMode, ScanConfig, ScanError};
use std::io::{self, Write};

/// Writer that accepts a fixed number of writes, then fails
struct FlakyWriter {
    out: Vec<u8>,
    remaining: usize,
}

impl FlakyWriter {
    fn accepting(writes: usize) -> Self {
        Self {
            out: Vec::new(),
            remaining: writes,
        }
    }
}

impl Write for FlakyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
        }
        self.remaining -= 1;
        self.out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn tight_escape(escape_buffer_size: usize) -> ScanConfig {
    ScanConfig {
        escape_buffer_size,
        ..Default::default()
    }
}

/// ============================================================================
/// SINK FAILURES
/// ============================================================================

/// Test a sink that rejects the first record
///
/// **Bug this finds:** Sink errors swallowed, session continuing blindly
/// **Invariant verified:** finish() returns the sink error
#[test]
fn test_failing_sink_reported_by_finish() {
    // Arrange
    let mut fx = HeapFixture::new();
    let (a, b) = (fx.int(1), fx.int(2));
    let mut dumper =
        GraphDumper::new(&fx.heap, IoSink::new(FlakyWriter::accepting(0)), ScanConfig::default()).unwrap();

    // Act
    let first = dumper.dump(a, &ExclusionSet::empty(), RecursionMode::None);
    let second = dumper.dump(b, &ExclusionSet::empty(), RecursionMode::None);

    // Assert
    assert_eq!(first, 0);
    assert_eq!(second, 0);
    assert!(dumper.failure().map_or(false, ScanError::is_fatal));
    assert!(matches!(dumper.finish(), Err(ScanError::Sink(_))));
}

/// Test output stops at a record boundary when the sink fails midway
///
/// **Bug this finds:** Half-written records, emission after failure
#[test]
fn test_sink_failure_midway_keeps_whole_records() {
    // Arrange
    let mut fx = HeapFixture::new();
    for _ in 0..5 {
        fx.list(&[], 0);
    }
    let mut sink = IoSink::new(FlakyWriter::accepting(2));

    // Act
    let mut dumper = GraphDumper::new(&fx.heap, &mut sink, ScanConfig::default()).unwrap();
    let emitted = dumper.dump_live_objects(&fx.heap, &ExclusionSet::empty(), RecursionMode::Full);
    let stats = *dumper.stats();
    let sink_failed = matches!(dumper.finish(), Err(ScanError::Sink(_)));

    // Assert
    assert_eq!(emitted, 2);
    assert_eq!(stats.records_emitted, 2);
    assert!(sink_failed);
    let written = sink.into_inner().out;
    assert_eq!(parse_strict(&written).len(), 2);
}

/// Test the reachability walk stops on sink failure
#[test]
fn test_failing_sink_stops_reachability_walk() {
    let mut fx = HeapFixture::new();
    let leaf = fx.text("leaf");
    let root = fx.list(&[leaf], 1);
    let mut sink = IoSink::new(FlakyWriter::accepting(1));

    let mut dumper = GraphDumper::new(&fx.heap, &mut sink, ScanConfig::default()).unwrap();
    assert_eq!(dumper.dump_all_referenced(root), 1);
    assert!(dumper.finish().is_err());
}

/// ============================================================================
/// HOST CAPABILITY FAILURES
/// ============================================================================

/// Test a traversal failing midway keeps the references seen so far
///
/// **Bug this finds:** Dropping the whole record or the whole refs list
/// **Invariant verified:** refs is the prefix yielded before the failure
#[test]
fn test_traversal_failure_truncates_refs() {
    // Arrange
    let mut fx = HeapFixture::new();
    let items: Vec<_> = (0..3).map(|i| fx.int(i)).collect();
    let list = fx.list(&items, 4);
    fx.heap.fail_traversal_after(list, 1);

    // Act
    let records = fx.dump(list, RecursionMode::Full);

    // Assert
    assert_eq!(records[0].refs, vec![addr(items[0])]);
    assert_eq!(addresses(&records), vec![addr(list), addr(items[0])]);
    assert_eq!(records[0].len, Some(3));
}

/// Test failing length and self-report fall back to the basic size
#[test]
fn test_failing_size_capabilities() {
    // Arrange
    let mut fx = HeapFixture::new();
    let a = fx.int(1);
    let tuple = fx.tuple(&[a, a]);
    fx.heap.set_length(tuple, Err("len raised".to_string()));
    let widget = fx.object();
    fx.heap.set_reported_size(widget, Err("sizeof raised".to_string()));

    // Act
    let tuple_record = fx.dump(tuple, RecursionMode::None);
    let widget_record = fx.dump(widget, RecursionMode::None);

    // Assert
    assert_eq!(tuple_record[0].size, 24 + 16);
    assert_eq!(tuple_record[0].len, Some(2));
    assert_eq!(widget_record[0].size, 16);
}

/// Test references to objects the host cannot describe
///
/// **Bug this finds:** Panics on dangling handles
#[test]
fn test_unknown_reference_dumped_generically() {
    let mut fx = HeapFixture::new();
    let dangling = ObjectHandle::new(0xdead_0000);
    let list = fx.list(&[dangling], 1);

    let records = fx.dump(list, RecursionMode::Full);

    assert_eq!(addresses(&records), vec![addr(list), addr(dangling)]);
    assert_eq!(records[1].type_name, "<unknown>");
    assert_eq!(records[1].size, 0);
    assert!(records[1].refs.is_empty());
}

/// ============================================================================
/// ESCAPE OVERFLOW
/// ============================================================================

/// Test optional fields that do not fit are dropped and counted
///
/// **Bug this finds:** Truncated literals, corrupt lines on overflow
/// **Invariant verified:** Record stays valid; only the field is missing
#[test]
fn test_escape_overflow_drops_optional_fields() {
    // Arrange
    let mut fx = HeapFixture::new();
    let function = fx.function("a_rather_long_function_name");
    let long_text = fx.text(&"x".repeat(30));
    let short_text = fx.text("short");
    let root = fx.list(&[function, long_text, short_text], 3);

    // Act
    let mut dumper = GraphDumper::new(&fx.heap, Vec::new(), tight_escape(16)).unwrap();
    dumper.dump(root, &ExclusionSet::empty(), RecursionMode::Full);
    let (out, stats) = dumper.finish().unwrap();
    let records = parse_strict(&out);

    // Assert
    assert_eq!(records.len(), 4);
    assert_eq!(records[1].name, None);
    assert_eq!(records[2].len, Some(30));
    assert_eq!(records[2].value, None);
    assert!(records[3].value.is_some());
    assert_eq!(stats.fields_dropped, 2);
}

/// Test a type name longer than the escape buffer is truncated
///
/// **Bug this finds:** Records without a type field
#[test]
fn test_escape_overflow_truncates_type_name() {
    // Arrange
    let mut fx = HeapFixture::new();
    let ty = fx
        .heap
        .define_type(TypeDescriptor::named("AnExtremelyLongTypeName", Category::Generic, 32));
    let obj = fx.heap.insert(ty, OwnedShape::Generic);

    // Act
    let records = fx.dump_with(obj, &ExclusionSet::empty(), RecursionMode::None, tight_escape(16));

    // Assert
    assert_eq!(records[0].type_name, "AnExtremelyLon");
    assert_eq!(records[0].size, 32);
}

/// Test escapes are never split at the buffer edge
#[test]
fn test_escape_overflow_never_splits_escape() {
    let mut fx = HeapFixture::new();
    let ty = fx
        .heap
        .define_type(TypeDescriptor::named("ab\u{e9}\u{e9}", Category::Generic, 8));
    let obj = fx.heap.insert(ty, OwnedShape::Generic);

    let records = fx.dump_with(obj, &ExclusionSet::empty(), RecursionMode::None, tight_escape(12));

    // '"ab' + one 6-byte escape + '"' fills 10 of 12 bytes; the second escape does not fit
    assert_eq!(records[0].type_name, "ab\u{e9}");
}

/// ============================================================================
/// CONFIGURATION EDGES
/// ============================================================================

/// Test output is independent of the initial scratch capacity
///
/// **Bug this finds:** Records cut at the initial buffer size
#[test]
fn test_zero_scratch_capacity_grows() {
    // Arrange
    let mut fx = HeapFixture::new();
    let items: Vec<_> = (0..50).map(|i| fx.int(i)).collect();
    let root = fx.list(&items, 64);
    let tiny = ScanConfig {
        scratch_capacity: 0,
        ..Default::default()
    };

    // Act
    let expected = fx.dump(root, RecursionMode::Full);
    let actual = fx.dump_with(root, &ExclusionSet::empty(), RecursionMode::Full, tiny);

    // Assert
    assert_eq!(actual, expected);
    assert_eq!(actual[0].refs.len(), 50);
}

/// Test an unreservable scratch buffer fails session start
#[test]
fn test_unreservable_scratch_rejected() {
    let fx = HeapFixture::new();
    let config = ScanConfig {
        scratch_capacity: usize::MAX,
        ..Default::default()
    };

    let err = GraphDumper::new(&fx.heap, Vec::new(), config).err().unwrap();
    assert!(matches!(err, ScanError::ScratchExhausted { .. }));
    assert!(err.is_fatal());
}

/// Test invalid escape settings are rejected up front
#[test]
fn test_invalid_escape_config_rejected() {
    let fx = HeapFixture::new();
    let err = GraphDumper::new(&fx.heap, Vec::new(), tight_escape(2)).err().unwrap();
    assert!(matches!(err, ScanError::Configuration(_)));
}
