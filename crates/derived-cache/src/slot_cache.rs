//! Keyed get-or-compute cache with at-most-once population.
//!
//! Each key maps to a shared [`OnceCell`] slot. The map lock is held only
//! while looking up or inserting the slot, never while computing, so slow
//! computations for different keys run independently. Concurrent first
//! readers of the same key block on the slot until the single computation
//! finishes.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::debug;

/// Statistics for a slot cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct SlotCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Number of times a value was actually computed.
    pub computations: u64,
    pub entries: usize,
}

impl SlotCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

pub struct SlotCache<K, V> {
    name: &'static str,
    slots: RwLock<HashMap<K, Arc<OnceCell<V>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    computations: AtomicU64,
}

impl<K, V> SlotCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            computations: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached value for `key`, computing it with `compute` if this
    /// is the first request.
    pub fn get_or_compute<F>(&self, key: &K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let slot = self.slot(key);
        if let Some(value) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, ?key, "Cache hit");
            return value.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        slot.get_or_init(|| {
            self.computations.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, ?key, "Populating cache slot");
            compute()
        })
        .clone()
    }

    /// The populated value for `key`, without computing.
    pub fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let value = slots.get(key).and_then(|slot| slot.get().cloned());
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|slot| slot.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SlotCacheStats {
        SlotCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Shared slot for `key`, inserted on first use.
    fn slot(&self, key: &K) -> Arc<OnceCell<V>> {
        // Try the read lock first
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring the write lock
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }
}

impl<K, V> Debug for SlotCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotCache")
            .field("name", &self.name)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}
