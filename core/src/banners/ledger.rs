//! Dismissal ledger
//!
//! Persistent set of banner ids this client has dismissed. Survives reloads
//! through the injected [`KeyValueStore`]; never shared with the server.

use std::collections::HashSet;

use marquee_types::BannerId;

use crate::storage::KeyValueStore;

/// Fixed storage key holding the JSON list of dismissed ids
pub const DISMISSED_BANNERS_KEY: &str = "dismissedBanners";

#[derive(Debug)]
pub struct DismissalLedger<S> {
    store: S,
    dismissed: HashSet<BannerId>,
}

impl<S: KeyValueStore> DismissalLedger<S> {
    /// Open the ledger, loading whatever the store already holds
    pub fn open(store: S) -> Self {
        let mut ledger = Self {
            store,
            dismissed: HashSet::new(),
        };
        ledger.dismissed = ledger.load();
        ledger
    }

    /// Read the persisted set. Fails soft: an unavailable store or a corrupt
    /// value yields an empty set instead of an error.
    pub fn load(&self) -> HashSet<BannerId> {
        let raw = match self.store.get_item(DISMISSED_BANNERS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Dismissal storage unavailable, starting empty");
                return HashSet::new();
            }
        };
        match serde_json::from_str::<Vec<BannerId>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt dismissal record, starting empty");
                HashSet::new()
            }
        }
    }

    /// Add `id` and persist before returning.
    ///
    /// Returns `true` if the id was newly added. Recording an id twice is a
    /// no-op and performs no write. A failed write keeps the id in memory
    /// for this session only.
    pub fn record(&mut self, id: BannerId) -> bool {
        if !self.dismissed.insert(id) {
            return false;
        }
        if let Err(e) = self.persist() {
            tracing::warn!(banner_id = id, error = %e, "Failed to persist dismissal");
        }
        true
    }

    fn persist(&mut self) -> Result<(), crate::storage::StorageError> {
        let mut ids: Vec<BannerId> = self.dismissed.iter().copied().collect();
        ids.sort_unstable();
        let value = serde_json::to_string(&ids).map_err(|e| {
            crate::storage::StorageError::Unavailable(format!("serialize dismissals: {e}"))
        })?;
        self.store.set_item(DISMISSED_BANNERS_KEY, &value)
    }

    pub fn contains(&self, id: BannerId) -> bool {
        self.dismissed.contains(&id)
    }

    pub fn dismissed(&self) -> &HashSet<BannerId> {
        &self.dismissed
    }

    pub fn len(&self) -> usize {
        self.dismissed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dismissed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    /// Store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    /// Counts writes so idempotence can be observed
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: usize,
    }

    impl KeyValueStore for CountingStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.writes += 1;
            self.inner.set_item(key, value)
        }
    }

    #[test]
    fn test_record_then_load_on_fresh_instance() {
        let store = MemoryStore::new();
        let mut ledger = DismissalLedger::open(store.clone());
        assert!(ledger.record(7));

        let fresh = DismissalLedger::open(store);
        assert!(fresh.load().contains(&7));
        assert!(fresh.contains(7));
    }

    #[test]
    fn test_record_is_idempotent() {
        let mut ledger = DismissalLedger::open(CountingStore::default());
        assert!(ledger.record(4));
        assert!(!ledger.record(4));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.store.writes, 1, "duplicate dismiss must not write");
    }

    #[test]
    fn test_persisted_form_is_sorted_id_list() {
        let store = MemoryStore::new();
        let mut ledger = DismissalLedger::open(store.clone());
        ledger.record(12);
        ledger.record(3);
        ledger.record(8);
        assert_eq!(
            store.get_item(DISMISSED_BANNERS_KEY).unwrap().as_deref(),
            Some("[3,8,12]")
        );
    }

    #[test]
    fn test_corrupt_value_loads_empty() {
        let mut store = MemoryStore::new();
        store.set_item(DISMISSED_BANNERS_KEY, "[1, 2,").unwrap();
        let ledger = DismissalLedger::open(store);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unavailable_store_still_tracks_in_memory() {
        let mut ledger = DismissalLedger::open(BrokenStore);
        assert!(ledger.is_empty());
        assert!(ledger.record(5));
        assert!(ledger.contains(5));
        assert!(ledger.load().is_empty(), "nothing survives a reload");
    }

    #[test]
    fn test_existing_record_is_extended() {
        let mut store = MemoryStore::new();
        store.set_item(DISMISSED_BANNERS_KEY, "[2]").unwrap();
        let mut ledger = DismissalLedger::open(store.clone());
        assert!(ledger.contains(2));
        ledger.record(1);
        assert_eq!(
            store.get_item(DISMISSED_BANNERS_KEY).unwrap().as_deref(),
            Some("[1,2]")
        );
    }
}
