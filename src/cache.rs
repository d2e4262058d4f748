//! Cache-or-compute for expensive derived views.
//!
//! # Caching Strategy
//!
//! ```text
//! TtlCache<K, V>
//! └── RwLock<FxHashMap<K, Arc<Mutex<Slot<V>>>>>
//!     └── Slot
//!         └── entry: Option<(value, computed_at, version)>
//!
//! Access Flow:
//! 1. Look up (or create) the key's slot under a short map lock
//! 2. Lock the slot; concurrent callers for the same key queue here
//! 3. Entry fresh (age < ttl && version matches) → return clone
//! 4. Otherwise run f() on this thread
//!    ├── Ok  → store (value, now, version), return
//!    └── Err → clear entry, return error (nothing cached)
//! ```
//!
//! Freshness is tied to the snapshot version the caller passes in, so a value
//! computed against an old snapshot is never served after a reload, even if
//! its TTL has not expired.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::{
    hash::Hash,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

struct Entry<V> {
    value: V,
    computed_at: Instant,
    version: u64,
}

/// Per-key slot. Holding its mutex is what makes computation single-flight.
struct Slot<V> {
    entry: Option<Entry<V>>,
}

impl<V: Clone> Slot<V> {
    fn fresh(&self, ttl: Duration, version: u64) -> Option<V> {
        self.entry
            .as_ref()
            .filter(|e| e.version == version && e.computed_at.elapsed() < ttl)
            .map(|e| e.value.clone())
    }
}

/// Generic TTL cache, version-tagged and single-flight per key.
///
/// `V` is cloned on every hit, so wrap large values in `Arc`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: RwLock<FxHashMap<K, Arc<Mutex<Slot<V>>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key` if fresh for `version`, otherwise
    /// compute it with `f`.
    ///
    /// `f` runs on the calling thread while the key's slot is locked; callers
    /// for other keys are not blocked. Errors are returned as-is and leave the
    /// slot empty.
    pub fn get_or_compute<E>(
        &self,
        key: &K,
        version: u64,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let slot = self.slot(key);
        let mut slot = slot.lock();

        if let Some(value) = slot.fresh(self.ttl, version) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        match f() {
            Ok(value) => {
                slot.entry = Some(Entry {
                    value: value.clone(),
                    computed_at: Instant::now(),
                    version,
                });
                Ok(value)
            }
            Err(err) => {
                slot.entry = None;
                Err(err)
            }
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        for slot in self.slots.read().values() {
            slot.lock().entry = None;
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn slot(&self, key: &K) -> Arc<Mutex<Slot<V>>> {
        // Fast path: slot exists
        if let Some(slot) = self.slots.read().get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(Slot { entry: None }))),
        )
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("keys", &self.slots.read().len())
            .finish()
    }
}
