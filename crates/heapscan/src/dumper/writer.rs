//! Record Writer - Composes one dump line in a scratch buffer
//!
//! ```text
//! {"address": <uint>, "type": "<name>", "size": <int>
//!   [, "name": "..."] [, "len": <int>] [, "value": "..." | <int>]
//!   , "refs": [<uint>, ...]}\n
//! ```
//!
//! Callers must add fields in the order above. The scratch buffer only grows
//! through `try_reserve`; a failed reservation is
//! [`ScanError::ScratchExhausted`] and ends the session.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::escape::JsonEscaper;
use crate::object::{ObjectHandle, TextData};

/// Outcome of writing an optional string field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Written,
    /// Escaped literal did not fit, field omitted
    Dropped,
}

/// Scratch buffer plus escaper, reused for every record of a session
#[derive(Debug)]
pub struct RecordWriter {
    buf: Vec<u8>,
    escaper: JsonEscaper,
    first_ref: bool,
}

impl RecordWriter {
    /// Create writer sized from the configuration
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let mut buf = Vec::new();
        reserve(&mut buf, config.scratch_capacity)?;
        Ok(Self {
            buf,
            escaper: JsonEscaper::new(config.escape_buffer_size, config.max_escaped_units),
            first_ref: true,
        })
    }

    /// Start a record with the required leading fields
    ///
    /// A type name that does not fit the escape buffer is truncated at the
    /// last complete escaped unit.
    pub fn begin(&mut self, address: ObjectHandle, type_name: &str, size: usize) -> Result<()> {
        self.buf.clear();
        self.first_ref = true;

        push(&mut self.buf, b"{\"address\": ")?;
        push_uint(&mut self.buf, address.address() as u64)?;
        push(&mut self.buf, b", \"type\": ")?;

        if self.escaper.escape_str(type_name).is_err() {
            log::warn!("type name of {} truncated to {} bytes", address, self.escaper.capacity());
            self.escaper.close_truncated();
        }
        push(&mut self.buf, self.escaper.as_bytes())?;

        push(&mut self.buf, b", \"size\": ")?;
        push_uint(&mut self.buf, size as u64)
    }

    /// Add `"name"` from a string
    pub fn name(&mut self, name: &str) -> Result<FieldOutcome> {
        let escaped = self.escaper.escape_str(name).map(|_| ());
        self.optional_field("name", escaped)
    }

    /// Add `"len"`
    pub fn len(&mut self, len: usize) -> Result<()> {
        push(&mut self.buf, b", \"len\": ")?;
        push_uint(&mut self.buf, len as u64)
    }

    /// Add `"value"` from a raw byte buffer
    pub fn value_bytes(&mut self, data: &[u8]) -> Result<FieldOutcome> {
        let escaped = self.escaper.escape_bytes(data, Some(data.len())).map(|_| ());
        self.optional_field("value", escaped)
    }

    /// Add `"value"` from text character data
    pub fn value_text(&mut self, data: TextData<'_>) -> Result<FieldOutcome> {
        let escaped = self.escaper.escape_code_points(data.code_points()).map(|_| ());
        self.optional_field("value", escaped)
    }

    /// Add `"value"` from a string
    pub fn value_str(&mut self, value: &str) -> Result<FieldOutcome> {
        let escaped = self.escaper.escape_str(value).map(|_| ());
        self.optional_field("value", escaped)
    }

    /// Add a numeric `"value"`
    pub fn value_int(&mut self, value: i64) -> Result<()> {
        push(&mut self.buf, b", \"value\": ")?;
        if value < 0 {
            push(&mut self.buf, b"-")?;
        }
        push_uint(&mut self.buf, value.unsigned_abs())
    }

    /// Open the `"refs"` array
    pub fn begin_refs(&mut self) -> Result<()> {
        self.first_ref = true;
        push(&mut self.buf, b", \"refs\": [")
    }

    /// Append one reference address
    pub fn push_ref(&mut self, child: ObjectHandle) -> Result<()> {
        if !self.first_ref {
            push(&mut self.buf, b", ")?;
        }
        self.first_ref = false;
        push_uint(&mut self.buf, child.address() as u64)
    }

    /// Close the record and return the complete line
    pub fn finish(&mut self) -> Result<&[u8]> {
        push(&mut self.buf, b"]}\n")?;
        Ok(&self.buf)
    }

    /// Append an escaped string field, or drop it if escaping overflowed
    fn optional_field(&mut self, field: &str, escaped: Result<()>) -> Result<FieldOutcome> {
        match escaped {
            Ok(()) => {}
            Err(err) if err.is_field_local() => {
                log::warn!("dropping {} field: {}", field, err);
                return Ok(FieldOutcome::Dropped);
            }
            Err(err) => return Err(err),
        }
        push(&mut self.buf, b", \"")?;
        push(&mut self.buf, field.as_bytes())?;
        push(&mut self.buf, b"\": ")?;
        push(&mut self.buf, self.escaper.as_bytes())?;
        Ok(FieldOutcome::Written)
    }
}

fn reserve(buf: &mut Vec<u8>, additional: usize) -> Result<()> {
    buf.try_reserve(additional)
        .map_err(|_| ScanError::ScratchExhausted {
            requested: buf.len().saturating_add(additional),
        })
}

#[inline]
fn push(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    reserve(buf, bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Decimal digits without going through the formatter
fn push_uint(buf: &mut Vec<u8>, mut value: u64) -> Result<()> {
    let mut digits = [0u8; 20];
    let mut start = digits.len();
    loop {
        start -= 1;
        digits[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    push(buf, &digits[start..])
}
