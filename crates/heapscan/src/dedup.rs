//! Dedup Module - Emission filters for a dump session
//!
//! Two independent mechanisms decide whether an object is emitted:
//!
//! - [`DedupFilter`] - single-slot memo of the last emitted handle. It only
//!   suppresses an immediately repeated emission, it is not a visited set.
//! - [`ExclusionSet`] - caller-supplied objects to omit. An excluded object
//!   emits nothing and is not recursed into; its descendants stay reachable
//!   through other paths.

use crate::object::{HeapModel, ObjectHandle};
use indexmap::IndexSet;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;

/// Consecutive-duplicate memo
///
/// # Examples
///
/// ```rust
/// use heapscan::dedup::DedupFilter;
/// use heapscan::object::ObjectHandle;
///
/// let mut filter = DedupFilter::new();
/// let obj = ObjectHandle::new(0x1000);
///
/// assert!(filter.should_emit(obj));
/// assert!(!filter.should_emit(obj));
///
/// filter.reset();
/// assert!(filter.should_emit(obj));
/// ```
#[derive(Debug, Default, Clone)]
pub struct DedupFilter {
    last: Option<ObjectHandle>,
}

impl DedupFilter {
    /// Create filter with an empty slot
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Check and record an emission
    ///
    /// Returns false iff `obj` is the last emitted handle.
    #[inline]
    pub fn should_emit(&mut self, obj: ObjectHandle) -> bool {
        if self.last == Some(obj) {
            return false;
        }
        self.last = Some(obj);
        true
    }

    /// Clear the slot
    pub fn reset(&mut self) {
        self.last = None;
    }
}

type MemberSet = IndexSet<ObjectHandle, BuildHasherDefault<FxHasher>>;

/// Objects to omit from a dump
///
/// Holds an optional container object and a set of identity members.
/// An object is excluded when it is the container itself, an identity
/// member, or (if the host supports it) value-contained in the container.
#[derive(Debug, Default, Clone)]
pub struct ExclusionSet {
    container: Option<ObjectHandle>,
    members: MemberSet,
}

impl ExclusionSet {
    /// Exclude nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exclude a host collection and whatever it contains
    pub fn from_container(container: ObjectHandle) -> Self {
        Self {
            container: Some(container),
            members: MemberSet::default(),
        }
    }

    /// Exclude the given objects by identity
    pub fn with_members(members: impl IntoIterator<Item = ObjectHandle>) -> Self {
        Self {
            container: None,
            members: members.into_iter().collect(),
        }
    }

    /// Add an identity member
    pub fn insert(&mut self, obj: ObjectHandle) -> bool {
        self.members.insert(obj)
    }

    /// Container object, if any
    pub fn container(&self) -> Option<ObjectHandle> {
        self.container
    }

    /// Identity members in insertion order
    pub fn members(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        self.members.iter().copied()
    }

    /// Check if nothing can be excluded
    pub fn is_empty(&self) -> bool {
        self.container.is_none() && self.members.is_empty()
    }

    /// Check whether `obj` must be omitted
    ///
    /// A failing containment query counts as "not contained".
    pub fn is_excluded<M: HeapModel + ?Sized>(&self, model: &M, obj: ObjectHandle) -> bool {
        if self.container == Some(obj) || self.members.contains(&obj) {
            return true;
        }

        let Some(container) = self.container else {
            return false;
        };

        match model.value_contains(container, obj) {
            Ok(contained) => contained,
            Err(err) => {
                log::trace!("containment query on {} failed: {}", container, err);
                false
            }
        }
    }
}
