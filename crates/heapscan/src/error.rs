//! Error Module - Heapscan Error Types
//!
//! Defines all error types used in heapscan.
//!
//! # Error Categories
//!
//! ## Session Errors
//! - `Sink` - The write sink rejected a record
//! - `ScratchExhausted` - Record scratch buffer could not grow
//!
//! ## Field Errors
//! - `EscapeOverflow` - An escaped string did not fit the escape buffer
//!
//! ## Configuration Errors
//! - `Configuration` - Invalid scan configuration
//!
//! ## Reading Errors
//! - `MalformedRecord` - A dump line is not a valid record
//!
//! Host capability failures (length, self-reported size, traversal,
//! containment) are reported as [`CapabilityError`] and never leave the core.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for heapscan operations
///
/// # Examples
///
/// ```rust
/// use heapscan::ScanError;
///
/// fn handle_error(err: ScanError) {
///     match err {
///         ScanError::Sink(io) => eprintln!("dump stream broken: {}", io),
///         ScanError::ScratchExhausted { requested } => {
///             eprintln!("out of scratch memory ({} bytes)", requested)
///         }
///         other => eprintln!("other error: {}", other),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ScanError {
    /// Write sink failure
    ///
    /// **When returned:** The sink could not accept a record
    ///
    /// **Recovery strategy:** None inside the session. The session stops
    /// emitting and `finish()` reports this error.
    #[error("Sink write failed: {0}")]
    Sink(#[from] std::io::Error),

    /// Record scratch buffer exhausted
    ///
    /// **When returned:** Growing the record buffer failed (out of memory)
    ///
    /// **Recovery strategy:** Cannot recover - terminate the session
    #[error("Scratch buffer exhausted: could not reserve {requested} bytes")]
    ScratchExhausted { requested: usize },

    /// Escape buffer overflow
    ///
    /// **When returned:** An escaped string literal exceeds the fixed escape buffer
    ///
    /// **Recovery strategy:** Drop the affected field, keep the record
    #[error("Escape buffer overflow: literal exceeds {capacity} bytes")]
    EscapeOverflow { capacity: usize },

    /// Configuration error
    ///
    /// **When returned:** `ScanConfig::validate` rejected the configuration
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Malformed dump record
    ///
    /// **When returned:** A dump line does not parse as a record
    #[error("Malformed dump record: {0}")]
    MalformedRecord(#[from] serde_json::Error),
}

impl ScanError {
    /// Check if this error terminates the dump session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::Sink(_) | ScanError::ScratchExhausted { .. }
        )
    }

    /// Check if this error only affects a single field of a record
    pub fn is_field_local(&self) -> bool {
        matches!(self, ScanError::EscapeOverflow { .. })
    }
}

/// Failure of an optional host capability
///
/// Returned by [`HeapModel`](crate::object::HeapModel) capability methods.
/// The core degrades on every variant: it skips the optional detail or falls
/// through to the next strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// The object's type does not provide this capability
    #[error("capability not supported: {0}")]
    Unsupported(&'static str),

    /// The capability exists but failed for this object
    #[error("capability failed: {0}")]
    Failed(String),
}

impl CapabilityError {
    /// Check if the capability is simply absent
    pub fn is_unsupported(&self) -> bool {
        matches!(self, CapabilityError::Unsupported(_))
    }
}

/// Result type alias for heapscan operations
pub type Result<T> = std::result::Result<T, ScanError>;
