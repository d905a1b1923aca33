//! Dump Statistics
//!
//! Counters collected by a [`GraphDumper`](crate::dumper::GraphDumper)
//! session. Serializable so a host can log them alongside the dump.

use serde::{Deserialize, Serialize};

/// Counters of one dump session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpStats {
    /// Records written to the sink
    pub records_emitted: u64,
    /// Reference addresses written across all records
    pub references_emitted: u64,
    /// Bytes handed to the sink
    pub bytes_written: u64,
    /// Objects skipped by the exclusion set
    pub excluded: u64,
    /// Objects skipped by the consecutive-duplicate memo
    pub deduplicated: u64,
    /// Recursions cut off by the depth limit
    pub depth_limited: u64,
    /// Optional fields dropped because the escaped value did not fit
    pub fields_dropped: u64,
}

impl DumpStats {
    /// Average references per record
    pub fn avg_refs_per_record(&self) -> f64 {
        if self.records_emitted == 0 {
            0.0
        } else {
            self.references_emitted as f64 / self.records_emitted as f64
        }
    }

    /// Objects considered but not written
    pub fn skipped(&self) -> u64 {
        self.excluded + self.deduplicated
    }
}
