//! Rendered image store with whole-store eviction.
//!
//! Provides in-memory storage of rendered cards keyed by track ID. Entries are
//! never replaced once written; the only way out is a full sweep.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::RwLock;

/// Track ID -> encoded image.
pub struct RenderStore {
    /// Images indexed by track ID. Swapped out wholesale on sweep.
    entries: RwLock<HashMap<String, Bytes>>,
}

impl RenderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the image for a track, if rendered in the current generation.
    pub fn get(&self, track_id: &str) -> Option<Bytes> {
        self.entries.read().get(track_id).cloned()
    }

    /// Inserts an image unless one is already present.
    ///
    /// Returns whichever image the store holds for the key afterwards.
    pub fn insert(&self, track_id: String, image: Bytes) -> Bytes {
        self.entries
            .write()
            .entry(track_id)
            .or_insert(image)
            .clone()
    }

    /// Checks if a track has a stored image.
    pub fn contains(&self, track_id: &str) -> bool {
        self.entries.read().contains_key(track_id)
    }

    /// Returns the number of stored images.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replaces the whole store with an empty one.
    ///
    /// Returns the number of evicted images. The old map is dropped after
    /// the write lock is released.
    pub fn sweep(&self) -> usize {
        let evicted = std::mem::take(&mut *self.entries.write());
        evicted.len()
    }
}

impl Default for RenderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_empty() {
        let store = RenderStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn insert_and_get() {
        let store = RenderStore::new();
        store.insert("abc123".to_string(), Bytes::from_static(b"png"));

        assert!(store.contains("abc123"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("abc123").unwrap(), Bytes::from_static(b"png"));
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = RenderStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn keys_are_case_sensitive() {
        let store = RenderStore::new();
        store.insert("AbC".to_string(), Bytes::from_static(b"1"));
        assert!(store.contains("AbC"));
        assert!(!store.contains("abc"));
    }

    #[test]
    fn existing_entry_is_not_replaced() {
        let store = RenderStore::new();
        store.insert("a".to_string(), Bytes::from_static(b"first"));
        let kept = store.insert("a".to_string(), Bytes::from_static(b"second"));

        assert_eq!(kept, Bytes::from_static(b"first"));
        assert_eq!(store.get("a").unwrap(), Bytes::from_static(b"first"));
    }

    #[test]
    fn sweep_removes_all() {
        let store = RenderStore::new();
        store.insert("a".to_string(), Bytes::from_static(b"1"));
        store.insert("b".to_string(), Bytes::from_static(b"2"));
        store.insert("c".to_string(), Bytes::from_static(b"3"));

        assert_eq!(store.sweep(), 3);
        assert!(store.is_empty());
        assert_eq!(store.sweep(), 0);
    }

    #[test]
    fn reader_keeps_bytes_across_sweep() {
        let store = RenderStore::new();
        store.insert("a".to_string(), Bytes::from_static(b"img"));
        let held = store.get("a").unwrap();

        store.sweep();

        assert_eq!(held, Bytes::from_static(b"img"));
        assert!(store.get("a").is_none());
    }
}
