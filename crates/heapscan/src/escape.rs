//! JSON String Escaper - Bounded string literals for dump records
//!
//! Turns a byte buffer or a sequence of code points into a quoted JSON
//! string literal inside a fixed buffer:
//!
//! - At most `max_units` logical units are read (bytes for raw buffers,
//!   code points for text). The rest is dropped silently.
//! - Units `<= 0x1F` or `> 0x7E` become `\uXXXX` escapes. Code points above
//!   the basic multilingual plane become a surrogate pair of two escapes.
//! - `\`, `/` and `"` are backslash-escaped.
//! - Surrogate code points and values above 0x10FFFF are not characters;
//!   they become `\ufffd` so every literal is valid JSON.
//! - Everything else is copied verbatim.
//!
//! The buffer is never written past its capacity. A literal that does not
//! fit returns [`ScanError::EscapeOverflow`]; the buffer then holds the
//! longest prefix of complete units and [`JsonEscaper::close_truncated`]
//! turns it into a valid, shorter literal.

use crate::error::{Result, ScanError};

const HEX: &[u8; 16] = b"0123456789abcdef";
const REPLACEMENT: u32 = 0xFFFD;

/// Escaper with a fixed output buffer, reused across records
#[derive(Debug)]
pub struct JsonEscaper {
    buf: Box<[u8]>,
    len: usize,
    max_units: usize,
}

impl JsonEscaper {
    /// Create escaper
    ///
    /// # Arguments
    /// * `capacity` - Output buffer size in bytes (at least 3)
    /// * `max_units` - Maximum logical units read from the input
    pub fn new(capacity: usize, max_units: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(3)].into_boxed_slice(),
            len: 0,
            max_units,
        }
    }

    /// Output buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Current buffer contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Escape a raw byte buffer
    ///
    /// With `len == None` the length is taken up to the first NUL byte
    /// (or the whole slice if there is none).
    pub fn escape_bytes(&mut self, input: &[u8], len: Option<usize>) -> Result<&[u8]> {
        let len = len
            .unwrap_or_else(|| input.iter().position(|&b| b == 0).unwrap_or(input.len()))
            .min(input.len())
            .min(self.max_units);

        self.open();
        for &byte in &input[..len] {
            self.push_unit(u32::from(byte))?;
        }
        self.close()
    }

    /// Escape a sequence of code points
    pub fn escape_code_points<I>(&mut self, code_points: I) -> Result<&[u8]>
    where
        I: IntoIterator<Item = u32>,
    {
        self.open();
        for code_point in code_points.into_iter().take(self.max_units) {
            self.push_unit(code_point)?;
        }
        self.close()
    }

    /// Escape a UTF-8 string by code points
    pub fn escape_str(&mut self, input: &str) -> Result<&[u8]> {
        self.escape_code_points(input.chars().map(u32::from))
    }

    /// Close the literal after an overflow
    ///
    /// Keeps every complete unit written so far.
    pub fn close_truncated(&mut self) -> &[u8] {
        // push() always leaves one byte for the closing quote
        self.buf[self.len] = b'"';
        self.len += 1;
        self.as_bytes()
    }

    fn open(&mut self) {
        self.buf[0] = b'"';
        self.len = 1;
    }

    fn close(&mut self) -> Result<&[u8]> {
        Ok(self.close_truncated())
    }

    fn push_unit(&mut self, c: u32) -> Result<()> {
        let c = if (0xD800..=0xDFFF).contains(&c) || c > 0x10FFFF {
            REPLACEMENT
        } else {
            c
        };

        if c <= 0x1F || c > 0x7E {
            if c > 0xFFFF {
                let c = c - 0x10000;
                let hi = 0xD800 | ((c >> 10) & 0x3FF);
                let lo = 0xDC00 | (c & 0x3FF);
                let mut pair = [0u8; 12];
                write_u_escape(&mut pair[..6], hi);
                write_u_escape(&mut pair[6..], lo);
                self.push(&pair)
            } else {
                let mut single = [0u8; 6];
                write_u_escape(&mut single, c);
                self.push(&single)
            }
        } else if c == u32::from(b'\\') || c == u32::from(b'/') || c == u32::from(b'"') {
            self.push(&[b'\\', c as u8])
        } else {
            self.push(&[c as u8])
        }
    }

    /// Append whole unit or nothing, keeping one byte for the closing quote
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        if self.len + bytes.len() + 1 > self.buf.len() {
            return Err(ScanError::EscapeOverflow {
                capacity: self.buf.len(),
            });
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

/// Write `\uXXXX` (lowercase hex) into a 6-byte slot
fn write_u_escape(slot: &mut [u8], value: u32) {
    slot[0] = b'\\';
    slot[1] = b'u';
    slot[2] = HEX[((value >> 12) & 0xF) as usize];
    slot[3] = HEX[((value >> 8) & 0xF) as usize];
    slot[4] = HEX[((value >> 4) & 0xF) as usize];
    slot[5] = HEX[(value & 0xF) as usize];
}
