//! Per-session storage of reference feature sets.
//!
//! The pipeline itself is stateless; callers inject a [`SessionStore`] to keep
//! the reference features of each session between the register and compare
//! calls. Entries are shared as `Arc<FeatureSet>` so a compare in flight keeps
//! the set it fetched even if the session is re-registered meanwhile
//! (last writer wins).

use crate::feature::FeatureSet;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Key-value store from session id to reference features.
pub trait SessionStore: Send + Sync {
    /// Returns the reference features registered for `id`.
    fn get(&self, id: &str) -> Option<Arc<FeatureSet>>;
    /// Inserts or overwrites the reference features for `id`.
    fn put(&self, id: &str, features: FeatureSet);
    /// Drops the entry for `id`, returning it if present.
    fn remove(&self, id: &str) -> Option<Arc<FeatureSet>>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn get(&self, id: &str) -> Option<Arc<FeatureSet>> {
        (**self).get(id)
    }

    fn put(&self, id: &str, features: FeatureSet) {
        (**self).put(id, features)
    }

    fn remove(&self, id: &str) -> Option<Arc<FeatureSet>> {
        (**self).remove(id)
    }
}

/// Process-local store guarded by a read-write lock. Never evicts on its own.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: RwLock<HashMap<String, Arc<FeatureSet>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true when no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> Option<Arc<FeatureSet>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, id: &str, features: FeatureSet) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::new(features));
    }

    fn remove(&self, id: &str) -> Option<Arc<FeatureSet>> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemorySessionStore, SessionStore};
    use crate::feature::{Descriptor, FeatureSet, Keypoint, DESCRIPTOR_LEN};

    fn one_point(x: f32) -> FeatureSet {
        FeatureSet::from_parts(
            vec![Keypoint::new(x, 0.0)],
            vec![Descriptor::new([0.0; DESCRIPTOR_LEN])],
        )
        .unwrap()
    }

    #[test]
    fn put_overwrites_and_keeps_fetched_snapshot() {
        let store = InMemorySessionStore::new();
        assert!(store.get("a").is_none());
        store.put("a", one_point(1.0));
        let first = store.get("a").unwrap();
        store.put("a", one_point(2.0));
        assert_eq!(first.get(0).unwrap().keypoint.x, 1.0);
        assert_eq!(store.get("a").unwrap().get(0).unwrap().keypoint.x, 2.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_drops_entry() {
        let store = InMemorySessionStore::new();
        store.put("a", one_point(1.0));
        assert!(store.remove("a").is_some());
        assert!(store.is_empty());
        assert!(store.remove("a").is_none());
    }
}
