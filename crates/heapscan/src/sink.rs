//! Write Sink - Append-only byte destination for dump records
//!
//! Every record is composed in the dumper's scratch buffer and handed to
//! the sink in a single `append_record` call, so records never interleave.

use crate::error::Result;
use std::io::Write;

/// Append-only byte sink
pub trait WriteSink {
    /// Append one complete record
    fn append_record(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush buffered output, if any
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl WriteSink for Vec<u8> {
    fn append_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: WriteSink + ?Sized> WriteSink for &mut S {
    fn append_record(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).append_record(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Sink over any [`std::io::Write`]
///
/// # Examples
///
/// ```rust
/// use heapscan::sink::{IoSink, WriteSink};
///
/// let mut sink = IoSink::new(Vec::new());
/// sink.append_record(b"{}\n").unwrap();
/// assert_eq!(sink.into_inner(), b"{}\n");
/// ```
#[derive(Debug)]
pub struct IoSink<W: Write> {
    writer: W,
}

impl<W: Write> IoSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Get the wrapped writer back
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> WriteSink for IoSink<W> {
    fn append_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Sink that hands every record to a callback
///
/// Useful when the caller collects records into its own structures.
pub struct CallbackSink<F: FnMut(&[u8])> {
    callback: F,
}

impl<F: FnMut(&[u8])> CallbackSink<F> {
    /// Create sink from callback
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: FnMut(&[u8])> WriteSink for CallbackSink<F> {
    fn append_record(&mut self, bytes: &[u8]) -> Result<()> {
        (self.callback)(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_vec_sink_appends() {
        let mut sink = Vec::new();
        sink.append_record(b"one\n").unwrap();
        sink.append_record(b"two\n").unwrap();
        assert_eq!(sink, b"one\ntwo\n");
    }

    #[test]
    fn test_io_sink_error_is_sink_error() {
        let mut sink = IoSink::new(BrokenWriter);
        let err = sink.append_record(b"x").unwrap_err();
        assert!(matches!(err, ScanError::Sink(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_callback_sink_sees_whole_records() {
        let mut records = Vec::new();
        {
            let mut sink = CallbackSink::new(|bytes: &[u8]| records.push(bytes.to_vec()));
            sink.append_record(b"{\"a\": 1}\n").unwrap();
            sink.append_record(b"{\"b\": 2}\n").unwrap();
        }
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], b"{\"b\": 2}\n");
    }

    #[test]
    fn test_borrowed_sink() {
        fn write_through<S: WriteSink>(mut sink: S) {
            sink.append_record(b"x").unwrap();
        }

        let mut inner = Vec::new();
        write_through(&mut inner);
        write_through(&mut inner);
        assert_eq!(inner, b"xx");
    }
}
