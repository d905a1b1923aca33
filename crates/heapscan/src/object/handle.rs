//! Object Handle - Stable identity of a live object
//!
//! A handle is the object's address in the host runtime. It is only
//! meaningful while the graph is frozen for the duration of a dump.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a live object, emitted as an unsigned decimal address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(usize);

impl ObjectHandle {
    /// Create handle from a raw address
    #[inline]
    pub const fn new(address: usize) -> Self {
        Self(address)
    }

    /// Get the raw address
    #[inline]
    pub const fn address(self) -> usize {
        self.0
    }
}

impl From<usize> for ObjectHandle {
    fn from(address: usize) -> Self {
        Self(address)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
