//! Lock-free dispatch plan cache.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::trace;

use super::DispatchKey;

type Entry = Arc<dyn Any + Send + Sync>;

/// Append-only map from [`DispatchKey`] to a compiled plan.
///
/// Reads load an immutable snapshot without locking. A miss compiles the plan
/// outside any lock and publishes a new snapshot; when two callers race on
/// the same key the first published plan wins and both get it back.
pub struct DispatchCache {
    entries: ArcSwap<HashMap<DispatchKey, Entry>>,
}

impl DispatchCache {
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Return the plan cached for `key`, building it with `build` on a miss.
    ///
    /// `build` must be pure; it may run more than once under contention but
    /// only one result is ever stored.
    pub fn plan<P, F>(&self, key: DispatchKey, build: F) -> Arc<P>
    where
        P: Send + Sync + 'static,
        F: FnOnce() -> P,
    {
        if let Some(plan) = self.lookup::<P>(&key) {
            return plan;
        }

        let built: Arc<P> = Arc::new(build());
        if self.insert(key, built.clone()) {
            trace!(kind = %key.kind(), entries = self.len(), "Dispatch plan cached");
        }

        self.lookup::<P>(&key).unwrap_or(built)
    }

    /// Store `entry` unless `key` is already present. Returns whether this
    /// call stored it.
    fn insert(&self, key: DispatchKey, entry: Entry) -> bool {
        let previous = self.entries.rcu(|current| {
            if current.contains_key(&key) {
                Arc::clone(current)
            } else {
                let mut next = HashMap::clone(current);
                next.insert(key, Arc::clone(&entry));
                Arc::new(next)
            }
        });
        !previous.contains_key(&key)
    }

    fn lookup<P: Send + Sync + 'static>(&self, key: &DispatchKey) -> Option<Arc<P>> {
        self.entries
            .load()
            .get(key)
            .and_then(|entry| Arc::clone(entry).downcast::<P>().ok())
    }

    /// Whether a plan has been cached for `key`.
    pub fn contains(&self, key: &DispatchKey) -> bool {
        self.entries.load().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }
}

impl Default for DispatchCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchCache")
            .field("entries", &self.len())
            .finish()
    }
}
