use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Time source for anything that expires.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used as the default evaluation date. Always the UTC date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cache hit and how long ago the value was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<V> {
    pub value: V,
    pub age: Duration,
}

/// Thread-safe map whose entries expire `ttl` after insertion.
///
/// Expired entries are dropped on lookup, and every insert sweeps out whatever else has expired,
/// so keys that are never read again do not accumulate. Nothing in the engine reads through it,
/// so a cold or disabled cache only costs recomputation.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, (DateTime<Utc>, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<CacheLookup<V>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let (stored_at, value) = entries.get(key)?;
        let age = now - *stored_at;
        if age >= self.ttl {
            entries.remove(key);
            return None;
        }

        Some(CacheLookup {
            value: value.clone(),
            age,
        })
    }

    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut entries = self.lock();
        Self::retain_fresh(&mut entries, now, self.ttl);
        entries.insert(key, (now, value));
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        Self::retain_fresh(&mut entries, now, self.ttl);
        before - entries.len()
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn retain_fresh(
        entries: &mut HashMap<K, (DateTime<Utc>, V)>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) {
        entries.retain(|_, (stored_at, _)| now - *stored_at < ttl);
    }

    // Every critical section is a single map operation; a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<K, (DateTime<Utc>, V)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
