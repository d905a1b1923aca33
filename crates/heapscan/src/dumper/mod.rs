//! Dumper Module - Streams object records to a sink
//!
//! A [`GraphDumper`] is one dump session. It owns the sink, the size
//! estimator, the consecutive-duplicate memo and the record scratch buffer.
//!
//! # Per-object flow
//!
//! ```text
//! dump(obj) ──► excluded? ──yes──► skip
//!                  │no
//!                  ▼
//!            last emitted? ──yes──► skip
//!                  │no
//!                  ▼
//!   address, type, size, [name], [len], [value], refs ──► sink
//!                  │
//!                  ▼
//!   None    : stop
//!   Shallow : dump leaf children (no traversal) with None
//!   Full    : dump every child with Full
//! ```
//!
//! # Failure model
//!
//! Host capability failures and escape overflows degrade a single field or
//! strategy. A sink error or scratch exhaustion is fatal: the session stops
//! emitting and [`GraphDumper::finish`] reports the error.
//!
//! # Cycles
//!
//! `dump` keeps no visited set. Only an immediately repeated object is
//! suppressed, so `Full` recursion over a cycle repeats until
//! `ScanConfig::max_recursion_depth` cuts it off. Use
//! [`GraphDumper::dump_all_referenced`] for a cycle-safe walk.

pub mod writer;

use crate::config::ScanConfig;
use crate::dedup::{DedupFilter, ExclusionSet};
use crate::error::{Result, ScanError};
use crate::object::{HeapModel, LiveObjects, ObjectHandle, ObjectShape};
use crate::scanner::{for_each_reference, has_traversal};
use crate::sink::WriteSink;
use crate::size::{SizeEstimator, SizeOverrides};
use crate::stats::DumpStats;
use rustc_hash::FxHashSet;
use std::ops::ControlFlow;
use writer::{FieldOutcome, RecordWriter};

/// How far a dump descends from its root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecursionMode {
    /// Emit only the root
    #[default]
    None,
    /// Also emit children that have no traversal capability
    Shallow,
    /// Emit every descendant
    Full,
}

/// One dump session
///
/// # Examples
///
/// ```rust
/// use heapscan::{ExclusionSet, GraphDumper, RecursionMode, ScanConfig};
/// use heapscan::object::{Category, OwnedShape, SnapshotHeap, TypeDescriptor};
///
/// let mut heap = SnapshotHeap::new();
/// let list_ty = heap.define_type(TypeDescriptor::new("list", Category::Sequence, 40).container());
/// let str_ty = heap.define_type(TypeDescriptor::new("str", Category::Text, 0));
/// let text = heap.insert(str_ty, OwnedShape::text("leaf"));
/// let list = heap.insert(list_ty, OwnedShape::Sequence { len: 1, allocated: 1 });
/// heap.add_ref(list, text);
///
/// let mut dumper = GraphDumper::new(&heap, Vec::new(), ScanConfig::default()).unwrap();
/// let emitted = dumper.dump(list, &ExclusionSet::empty(), RecursionMode::Shallow);
/// assert_eq!(emitted, 2);
///
/// let (out, stats) = dumper.finish().unwrap();
/// assert_eq!(stats.records_emitted, 2);
/// assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
/// ```
pub struct GraphDumper<'m, M: HeapModel + ?Sized, S: WriteSink> {
    model: &'m M,
    sink: S,
    config: ScanConfig,
    estimator: SizeEstimator,
    dedup: DedupFilter,
    writer: RecordWriter,
    stats: DumpStats,
    failure: Option<ScanError>,
}

impl<'m, M: HeapModel + ?Sized, S: WriteSink> GraphDumper<'m, M, S> {
    /// Start a session
    ///
    /// Fails if the configuration is invalid or the scratch buffer cannot be
    /// reserved.
    pub fn new(model: &'m M, sink: S, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let writer = RecordWriter::new(&config)?;

        log::debug!(
            "dump session started: depth limit {}, escape buffer {} bytes",
            config.max_recursion_depth,
            config.escape_buffer_size
        );

        Ok(Self {
            model,
            sink,
            estimator: SizeEstimator::new(config.layout),
            config,
            dedup: DedupFilter::new(),
            writer,
            stats: DumpStats::default(),
            failure: None,
        })
    }

    /// Read per-type size overrides from a shared registry
    pub fn with_overrides(mut self, overrides: SizeOverrides) -> Self {
        self.estimator = SizeEstimator::with_overrides(self.config.layout, overrides);
        self
    }

    /// Dump `root` and, depending on `mode`, its descendants
    ///
    /// Returns the number of records emitted by this call. Never fails; a
    /// fatal sink error is kept for [`finish`](Self::finish).
    pub fn dump(&mut self, root: ObjectHandle, exclusion: &ExclusionSet, mode: RecursionMode) -> usize {
        let before = self.stats.records_emitted;
        self.dump_at(root, exclusion, mode, 0);
        (self.stats.records_emitted - before) as usize
    }

    /// Dump everything reachable from `root`, each object exactly once
    ///
    /// Walks with an explicit stack and a full seen-set, so cycles and deep
    /// graphs are safe. Every object is dumped without recursion.
    pub fn dump_all_referenced(&mut self, root: ObjectHandle) -> usize {
        let model = self.model;
        let before = self.stats.records_emitted;
        let no_exclusion = ExclusionSet::empty();

        let mut pending = vec![root];
        let mut seen = FxHashSet::default();

        while let Some(next) = pending.pop() {
            if self.failure.is_some() {
                break;
            }
            if !seen.insert(next) {
                continue;
            }

            self.dump_at(next, &no_exclusion, RecursionMode::None, 0);

            for_each_reference(model, next, |child| {
                if !seen.contains(&child) {
                    pending.push(child);
                }
                ControlFlow::Continue(())
            });
        }

        (self.stats.records_emitted - before) as usize
    }

    /// Dump every live object
    ///
    /// The exclusion set's identity members are dumped first, once and
    /// without recursion, so shared objects appear exactly once. Then every
    /// object from `live` is dumped with `exclusion` and `mode`.
    pub fn dump_live_objects<L>(&mut self, live: &L, exclusion: &ExclusionSet, mode: RecursionMode) -> usize
    where
        L: LiveObjects + ?Sized,
    {
        let before = self.stats.records_emitted;
        let no_exclusion = ExclusionSet::empty();

        for member in exclusion.members() {
            self.dump_at(member, &no_exclusion, RecursionMode::None, 0);
        }

        live.for_each_live(&mut |obj| self.dump_at(obj, exclusion, mode, 0));

        let emitted = self.stats.records_emitted - before;
        log::debug!("dumped {} records from live objects", emitted);
        emitted as usize
    }

    /// Clear the consecutive-duplicate memo
    pub fn reset(&mut self) {
        self.dedup.reset();
    }

    /// Counters so far
    pub fn stats(&self) -> &DumpStats {
        &self.stats
    }

    /// Fatal error that stopped the session, if any
    pub fn failure(&self) -> Option<&ScanError> {
        self.failure.as_ref()
    }

    /// End the session
    ///
    /// Flushes the sink and returns it with the final counters, or the fatal
    /// error that stopped the session.
    pub fn finish(mut self) -> Result<(S, DumpStats)> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        self.sink.flush()?;

        log::debug!(
            "dump session finished: {} records, {} refs, {} bytes",
            self.stats.records_emitted,
            self.stats.references_emitted,
            self.stats.bytes_written
        );
        Ok((self.sink, self.stats))
    }

    fn dump_at(&mut self, obj: ObjectHandle, exclusion: &ExclusionSet, mode: RecursionMode, depth: usize) {
        if self.failure.is_some() {
            return;
        }

        let model = self.model;
        if exclusion.is_excluded(model, obj) {
            self.stats.excluded += 1;
            return;
        }
        if !self.dedup.should_emit(obj) {
            self.stats.deduplicated += 1;
            return;
        }

        if let Err(err) = self.emit(obj) {
            self.fail(err);
            return;
        }

        if mode == RecursionMode::None || !has_traversal(model, obj) {
            return;
        }
        if depth >= self.config.max_recursion_depth {
            log::warn!("recursion stopped at depth {} below {}", depth, obj);
            self.stats.depth_limited += 1;
            return;
        }

        let child_depth = depth + 1;
        for_each_reference(model, obj, |child| {
            match mode {
                RecursionMode::Full => self.dump_at(child, exclusion, RecursionMode::Full, child_depth),
                _ => self.dump_shallow_child(child, exclusion, child_depth),
            }
            if self.failure.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
    }

    /// Children the live-object enumerator never yields
    fn dump_shallow_child(&mut self, child: ObjectHandle, exclusion: &ExclusionSet, depth: usize) {
        let model = self.model;
        if !has_traversal(model, child) {
            self.dump_at(child, exclusion, RecursionMode::None, depth);
        } else if self.config.shallow_descends_untracked && !model.descriptor(child).gc_tracked {
            self.dump_at(child, exclusion, RecursionMode::Shallow, depth);
        }
    }

    /// Compose one record and hand it to the sink
    fn emit(&mut self, obj: ObjectHandle) -> Result<()> {
        let model = self.model;
        let descriptor = model.descriptor(obj);
        let shape = model.shape(obj);
        let size = self.estimator.estimate(model, obj);

        self.writer.begin(obj, &descriptor.name, size)?;

        let name = match shape {
            ObjectShape::Module { name } => name,
            ObjectShape::Function { name } | ObjectShape::TypeDef { name, .. } => Some(name),
            _ => None,
        };
        if let Some(name) = name {
            let outcome = self.writer.name(name)?;
            self.count_field(outcome);
        }

        match shape {
            ObjectShape::Bytes(data) => {
                self.writer.len(data.len())?;
                let outcome = self.writer.value_bytes(data)?;
                self.count_field(outcome);
            }
            ObjectShape::Text(text) => {
                self.writer.len(text.len)?;
                if let Some(data) = text.data {
                    let outcome = self.writer.value_text(data)?;
                    self.count_field(outcome);
                }
            }
            ObjectShape::Bool(value) => {
                let outcome = self.writer.value_str(if value { "True" } else { "False" })?;
                self.count_field(outcome);
            }
            ObjectShape::BigInt(int) => {
                // Omitted rather than truncated when it does not fit
                if let Some(value) = int.to_i64(self.config.layout.digit_bits) {
                    self.writer.value_int(value)?;
                }
            }
            ObjectShape::Sequence { .. }
            | ObjectShape::Tuple { .. }
            | ObjectShape::HashedSet { .. }
            | ObjectShape::Mapping(_) => {
                if let Some(len) = shape.container_len() {
                    self.writer.len(len)?;
                }
            }
            ObjectShape::Frame { routine: Some(routine) } => {
                let outcome = self.writer.value_str(routine)?;
                self.count_field(outcome);
            }
            _ => {}
        }

        self.writer.begin_refs()?;
        let mut refs = 0u64;
        let mut write_error = None;
        let writer = &mut self.writer;
        for_each_reference(model, obj, |child| match writer.push_ref(child) {
            Ok(()) => {
                refs += 1;
                ControlFlow::Continue(())
            }
            Err(err) => {
                write_error = Some(err);
                ControlFlow::Break(())
            }
        });
        if let Some(err) = write_error {
            return Err(err);
        }

        let record = self.writer.finish()?;
        self.sink.append_record(record)?;

        self.stats.records_emitted += 1;
        self.stats.references_emitted += refs;
        self.stats.bytes_written += record.len() as u64;
        Ok(())
    }

    fn count_field(&mut self, outcome: FieldOutcome) {
        if outcome == FieldOutcome::Dropped {
            self.stats.fields_dropped += 1;
        }
    }

    fn fail(&mut self, err: ScanError) {
        log::error!("dump session stopped: {}", err);
        self.failure = Some(err);
    }
}
