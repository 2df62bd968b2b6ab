//! Bounded memo of pipeline results with per-key single-flight.
//!
//! Each key maps to a shared [`OnceCell`]. The first caller for a key runs
//! the producer; concurrent callers for the same key await that cell instead
//! of starting their own upstream round trip. A failed or cancelled producer
//! leaves the cell empty and the empty slot is removed once nobody waits on
//! it, so failures are never cached and never hold an LRU position.

use lru::LruCache;
use parking_lot::Mutex;
use std::{future::Future, num::NonZeroUsize, sync::Arc};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::model::WeatherRecord;

type Slot = Arc<OnceCell<WeatherRecord>>;

pub struct ResponseCache {
    entries: Mutex<LruCache<String, Slot>>,
}

impl ResponseCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    /// Completed entry for `key`, if any.
    pub fn get(&self, key: &str) -> Option<WeatherRecord> {
        self.entries.lock().get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of completed entries.
    pub fn len(&self) -> usize {
        self.entries.lock().iter().filter(|(_, slot)| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Returns the cached record for `key`, or runs `init` to produce it.
    ///
    /// At most one `init` runs per key at a time. If the running producer is
    /// dropped or fails, one of the waiters takes over.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        init: F,
    ) -> Result<WeatherRecord, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WeatherRecord, E>>,
    {
        let slot = {
            let mut entries = self.entries.lock();
            entries.get_or_insert(key.to_string(), || Arc::new(OnceCell::new())).clone()
        };

        if let Some(hit) = slot.get() {
            debug!(key, "cache hit");
            return Ok(hit.clone());
        }

        // Runs on failure and on cancellation alike.
        let pending = PendingSlot { cache: self, key, slot };
        pending.slot.get_or_try_init(init).await.cloned()
    }

    // Drops an empty slot nobody else is waiting on.
    fn discard_empty(&self, key: &str, slot: &Slot) {
        let mut entries = self.entries.lock();
        let unused = entries.peek(key).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) <= 2
        });
        if unused {
            debug!(key, "dropping empty cache slot");
            entries.pop(key);
        }
    }
}

struct PendingSlot<'a> {
    cache: &'a ResponseCache,
    key: &'a str,
    slot: Slot,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.cache.discard_empty(self.key, &self.slot);
    }
}
