//! Configuration Module - Scan Tuning Parameters
//!
//! Manages all configuration parameters for heapscan.
//! Runtime layout constants depend on the host runtime's version and word
//! size, so none of them are hard-coded into the size formulas.

/// Runtime layout constants used by the size formulas
///
/// Every value here is specific to a runtime build. Use [`RuntimeLayout::lp64`]
/// or [`RuntimeLayout::ilp32`] as a starting point and adjust.
///
/// # Examples
///
/// ```rust
/// use heapscan::RuntimeLayout;
///
/// // Older runtimes with a three-word GC header
/// let layout = RuntimeLayout {
///     gc_header_size: 24,
///     ..RuntimeLayout::lp64()
/// };
/// assert!(layout.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeLayout {
    /// Size of an object pointer in bytes
    ///
    /// Default: 8
    pub pointer_size: usize,

    /// Bytes prepended to every GC-tracked object
    ///
    /// Default: 16 (two words)
    pub gc_header_size: usize,

    /// Size of one hashed-set table entry (key pointer + hash)
    ///
    /// Default: 16
    pub set_entry_size: usize,

    /// Storage width of one big-integer digit in bytes
    ///
    /// Default: 4
    pub digit_size: usize,

    /// Significant bits per big-integer digit
    ///
    /// Default: 30
    pub digit_bits: u32,

    /// Size of one legacy wide character in bytes
    ///
    /// Default: 4
    pub wchar_size: usize,

    /// Header size of compact ASCII text
    ///
    /// Default: 48
    pub ascii_header_size: usize,

    /// Header size of compact non-ASCII text
    ///
    /// Default: 72
    pub compact_header_size: usize,

    /// Header size of legacy two-block text
    ///
    /// Default: 80
    pub legacy_header_size: usize,
}

impl RuntimeLayout {
    /// Layout for 64-bit builds
    pub const fn lp64() -> Self {
        RuntimeLayout {
            pointer_size: 8,
            gc_header_size: 16,
            set_entry_size: 16,
            digit_size: 4,
            digit_bits: 30,
            wchar_size: 4,
            ascii_header_size: 48,
            compact_header_size: 72,
            legacy_header_size: 80,
        }
    }

    /// Layout for 32-bit builds
    pub const fn ilp32() -> Self {
        RuntimeLayout {
            pointer_size: 4,
            gc_header_size: 8,
            set_entry_size: 8,
            digit_size: 2,
            digit_bits: 15,
            wchar_size: 4,
            ascii_header_size: 24,
            compact_header_size: 36,
            legacy_header_size: 40,
        }
    }

    /// Validate layout constants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pointer_size != 4 && self.pointer_size != 8 {
            return Err(ConfigError::InvalidLayout(format!(
                "pointer_size must be 4 or 8, got {}",
                self.pointer_size
            )));
        }

        if self.digit_size == 0 || self.digit_size > 8 {
            return Err(ConfigError::InvalidLayout(
                "digit_size must be between 1 and 8 bytes".to_string(),
            ));
        }

        // Digits are carried as u32 values
        if self.digit_bits == 0
            || self.digit_bits > 32
            || self.digit_bits as usize > self.digit_size * 8
        {
            return Err(ConfigError::InvalidLayout(
                "digit_bits must be 1..=32 and fit inside digit_size".to_string(),
            ));
        }

        if self.ascii_header_size > self.compact_header_size
            || self.compact_header_size > self.legacy_header_size
        {
            return Err(ConfigError::InvalidLayout(
                "text headers must satisfy ascii <= compact <= legacy".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for RuntimeLayout {
    fn default() -> Self {
        Self::lp64()
    }
}

/// Main configuration for a dump session
///
/// # Examples
///
/// ```rust
/// use heapscan::ScanConfig;
///
/// let config = ScanConfig {
///     max_recursion_depth: 64,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Runtime layout constants for size estimation
    pub layout: RuntimeLayout,

    /// Maximum logical units (code points or bytes) in an escaped preview
    ///
    /// Anything beyond is dropped silently.
    /// Default: 100
    pub max_escaped_units: usize,

    /// Fixed size of the escape buffer in bytes
    ///
    /// An escaped literal that does not fit is dropped (optional fields)
    /// or truncated (the type name). Smaller than
    /// [`worst_case_escape_len`](Self::worst_case_escape_len), a full
    /// preview of wide characters can be dropped.
    /// Default: 1202 (100 surrogate pairs plus quotes)
    pub escape_buffer_size: usize,

    /// Initial capacity of the record scratch buffer in bytes
    ///
    /// Default: 4KB
    pub scratch_capacity: usize,

    /// Maximum recursion depth for `Shallow` and `Full` dumps
    ///
    /// Bounds the native stack on cyclic graphs.
    /// Default: 512
    pub max_recursion_depth: usize,

    /// Descend into untracked containers in `Shallow` mode
    ///
    /// When enabled, a child that has a traversal capability but is not
    /// GC-tracked is dumped with `Shallow` recursion too.
    /// Default: false
    pub shallow_descends_untracked: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            layout: RuntimeLayout::default(),
            max_escaped_units: DEFAULT_ESCAPED_UNITS,
            escape_buffer_size: escape_len_for(DEFAULT_ESCAPED_UNITS),
            scratch_capacity: 4 * KB,
            max_recursion_depth: 512,
            shallow_descends_untracked: false,
        }
    }
}

impl ScanConfig {
    /// Validate configuration
    ///
    /// Checks if all values are in valid ranges.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use heapscan::ScanConfig;
    ///
    /// let config = ScanConfig {
    ///     escape_buffer_size: 1,  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;

        if self.max_escaped_units == 0 {
            return Err(ConfigError::InvalidEscape(
                "max_escaped_units must be > 0".to_string(),
            ));
        }

        // Room for both quotes and at least one plain character
        if self.escape_buffer_size < MIN_ESCAPE_BUFFER {
            return Err(ConfigError::InvalidEscape(format!(
                "escape_buffer_size must be >= {}",
                MIN_ESCAPE_BUFFER
            )));
        }

        if self.escape_buffer_size < self.worst_case_escape_len() {
            log::warn!(
                "escape_buffer_size {} is below the worst case {} for {} units; wide previews may be dropped",
                self.escape_buffer_size,
                self.worst_case_escape_len(),
                self.max_escaped_units
            );
        }

        if self.max_recursion_depth == 0 {
            return Err(ConfigError::InvalidRecursionDepth(
                "max_recursion_depth must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Worst-case escaped length for a preview of `max_escaped_units`
    ///
    /// Each unit may expand to a surrogate pair (12 bytes), plus two quotes.
    pub fn worst_case_escape_len(&self) -> usize {
        escape_len_for(self.max_escaped_units)
    }
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid runtime layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid escape settings: {0}")]
    InvalidEscape(String),

    #[error("Invalid recursion depth: {0}")]
    InvalidRecursionDepth(String),
}

// ============================================================================
// CONSTANTS
// ============================================================================

const KB: usize = 1024;
const MIN_ESCAPE_BUFFER: usize = 3;
const DEFAULT_ESCAPED_UNITS: usize = 100;

const fn escape_len_for(units: usize) -> usize {
    units.saturating_mul(12).saturating_add(2)
}
