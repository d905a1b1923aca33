//! Type Descriptor - Per-type metadata read from the host
//!
//! ```text
//! TypeDescriptor
//! ┌──────────────┬──────────────────────────────────────────┐
//! │ name         │ emitted as "type"; override registry key │
//! │ category     │ selects size formula and record fields   │
//! │ basic_size   │ fixed part of every instance             │
//! │ item_size    │ per-item inline storage (0 = fixed size) │
//! │ gc_tracked   │ instances carry the GC header            │
//! │ traversable  │ type can enumerate direct references     │
//! └──────────────┴──────────────────────────────────────────┘
//! ```

use std::borrow::Cow;

/// Structural encoding family of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Growable sequence with over-allocated slot array
    Sequence,
    /// Fixed-size sequence with inline items
    Tuple,
    /// Hashed set (mutable or frozen)
    HashedSet,
    /// Hashed mapping, possibly with split key/value tables
    Mapping,
    /// Text buffer with variable internal width
    Text,
    /// Raw byte buffer with inline storage
    Bytes,
    /// Arbitrary-precision integer
    BigInt,
    /// Boolean singleton
    Bool,
    /// The none singleton
    NoneValue,
    /// Module object
    Module,
    /// Function object
    Function,
    /// Type definition object
    TypeDef,
    /// Execution frame
    Frame,
    /// Anything else
    Generic,
}

impl Category {
    /// Categories whose structural fallback already gives the exact size
    ///
    /// These skip the override registry and the self-reported size.
    #[inline]
    pub const fn fallback_is_exact(self) -> bool {
        matches!(
            self,
            Category::Tuple | Category::Bytes | Category::Bool | Category::NoneValue | Category::Module
        )
    }
}

/// Per-type metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Type name as reported by the runtime
    pub name: Cow<'static, str>,
    /// Category tag
    pub category: Category,
    /// Fixed instance size in bytes (without GC header)
    pub basic_size: usize,
    /// Per-item inline storage size, 0 for fixed-size types
    pub item_size: usize,
    /// Instances participate in cyclic garbage collection
    pub gc_tracked: bool,
    /// Type provides a traversal capability
    pub traversable: bool,
}

impl TypeDescriptor {
    /// Create descriptor with no item storage, no GC header, no traversal
    pub const fn new(name: &'static str, category: Category, basic_size: usize) -> Self {
        Self {
            name: Cow::Borrowed(name),
            category,
            basic_size,
            item_size: 0,
            gc_tracked: false,
            traversable: false,
        }
    }

    /// Create descriptor with an owned name (for dynamically defined types)
    pub fn named(name: impl Into<String>, category: Category, basic_size: usize) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            ..Self::new("", category, basic_size)
        }
    }

    /// Set per-item inline storage size
    pub const fn with_item_size(mut self, item_size: usize) -> Self {
        self.item_size = item_size;
        self
    }

    /// Mark instances as GC-tracked
    pub const fn gc_tracked(mut self) -> Self {
        self.gc_tracked = true;
        self
    }

    /// Mark type as providing a traversal capability
    pub const fn traversable(mut self) -> Self {
        self.traversable = true;
        self
    }

    /// Mark type as both GC-tracked and traversable (the common container case)
    pub const fn container(self) -> Self {
        self.gc_tracked().traversable()
    }

    /// Type declares variable-length inline storage
    #[inline]
    pub const fn is_var_sized(&self) -> bool {
        self.item_size != 0
    }
}
