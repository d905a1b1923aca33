//! Size Overrides - Registry of per-type custom estimators
//!
//! Maps a type name to a callback that returns the object's size in bytes
//! (without GC header). The registry is shared: clones see the same
//! entries, so a host can keep one handle for configuration while dump
//! sessions read through another.
//!
//! Callbacks are invoked with the registry lock released.

use crate::object::ObjectHandle;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Custom size estimator for one type
pub type SizeOverrideFn = Arc<dyn Fn(ObjectHandle) -> anyhow::Result<i64> + Send + Sync>;

/// Shared name -> estimator registry
///
/// # Examples
///
/// ```rust
/// use heapscan::size::SizeOverrides;
///
/// let overrides = SizeOverrides::new();
/// overrides.register("Matrix", |_obj| Ok(4096));
///
/// assert!(overrides.contains("Matrix"));
/// assert_eq!(overrides.names(), vec!["Matrix".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct SizeOverrides {
    entries: Arc<RwLock<IndexMap<String, SizeOverrideFn>>>,
}

impl SizeOverrides {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an estimator, returning the one it replaces
    pub fn register<F>(&self, type_name: impl Into<String>, estimator: F) -> Option<SizeOverrideFn>
    where
        F: Fn(ObjectHandle) -> anyhow::Result<i64> + Send + Sync + 'static,
    {
        self.entries
            .write()
            .insert(type_name.into(), Arc::new(estimator))
    }

    /// Remove the estimator for `type_name`
    pub fn remove(&self, type_name: &str) -> Option<SizeOverrideFn> {
        self.entries.write().shift_remove(type_name)
    }

    /// Estimator for `type_name`
    pub fn get(&self, type_name: &str) -> Option<SizeOverrideFn> {
        self.entries.read().get(type_name).cloned()
    }

    /// Check if `type_name` has an estimator
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.read().contains_key(type_name)
    }

    /// Registered type names in registration order
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of registered estimators
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every estimator
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl fmt::Debug for SizeOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeOverrides")
            .field("names", &self.names())
            .finish()
    }
}
