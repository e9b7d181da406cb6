use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::entry::{BitmapResource, CacheEntryHandle, OriginKey};

/// In-memory map of cache entries keyed by origin.
///
/// Plays the store's side of the handle contract for the C ABI and for
/// tests: it vends handles and reclaims the ones no surface uses. Capacity
/// and eviction order are the embedding application's business.
#[derive(Debug, Default)]
pub struct EntryStore {
    by_key: HashMap<OriginKey, CacheEntryHandle>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self { by_key: HashMap::new() }
    }

    /// Store a decoded bitmap and return a handle to it.
    ///
    /// An existing entry under the same key is dropped from the map and
    /// reclaimed if unused; surfaces still displaying it keep it alive.
    pub fn insert(
        &mut self,
        key: impl Into<OriginKey>,
        resource: impl Into<Arc<BitmapResource>>,
    ) -> CacheEntryHandle {
        let key = key.into();
        let handle = CacheEntryHandle::new(key.clone(), resource);
        if let Some(old) = self.by_key.insert(key, handle.clone()) {
            old.try_reclaim();
        }
        handle
    }

    pub fn get(&self, key: &OriginKey) -> Option<&CacheEntryHandle> {
        self.by_key.get(key)
    }

    pub fn contains_key(&self, key: &OriginKey) -> bool {
        self.by_key.contains_key(key)
    }

    /// Reclaim every entry no surface is displaying.
    ///
    /// Returns how many entries were removed.
    pub fn reclaim_unused(&mut self) -> usize {
        let before = self.by_key.len();
        self.by_key.retain(|_, handle| !handle.try_reclaim());
        let reclaimed = before - self.by_key.len();
        if reclaimed > 0 {
            log::debug!("store reclaimed {} entries, {} in use", reclaimed, self.by_key.len());
        }
        reclaimed
    }

    /// Drop every entry from the map, reclaiming the unused ones.
    pub fn clear(&mut self) {
        for handle in self.by_key.values() {
            handle.try_reclaim();
        }
        self.by_key.clear();
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
