//! Expiring key/value store
//!
//! The one primitive every other component leans on: a map whose entries
//! vanish after a fixed TTL, with an optional capacity that evicts in
//! insertion order (oldest first, not LRU).
//!
//! Expiry is lazy: nothing runs in the background, an entry past its TTL is
//! removed the moment a read or write touches it. All mutating and reading
//! methods have `*_at(now)` variants taking an explicit [`Instant`] so tests
//! advance time without sleeping; the plain variants use `Instant::now()`.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order; drives oldest-first capacity eviction.
    order: VecDeque<String>,
}

/// TTL map with optional max entry count.
///
/// Interior mutex so one instance can be shared between the message path and
/// the tick path of a channel task, or handed to a deferred task.
pub struct ExpiringMap<V> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    max_len: Option<usize>,
}

impl<V> ExpiringMap<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            max_len: None,
        }
    }

    pub fn with_max_len(ttl: Duration, max_len: usize) -> Self {
        let mut map = Self::new(ttl);
        map.max_len = Some(max_len);
        map
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn put(&self, key: &str, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Insert or overwrite. Re-inserting an existing key refreshes its age
    /// and moves it to the back of the eviction queue.
    pub fn put_at(&self, key: &str, value: V, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        self.insert_locked(&mut inner, key, value, now);
    }

    fn insert_locked(&self, inner: &mut Inner<V>, key: &str, value: V, now: Instant) {
        let is_new = inner.entries.remove(key).is_none();
        if is_new {
            if let Some(max) = self.max_len {
                while inner.entries.len() >= max {
                    match inner.order.pop_front() {
                        // The queue can hold keys already removed elsewhere;
                        // only a pop that hits a live entry counts.
                        Some(oldest) => {
                            inner.entries.remove(&oldest);
                        }
                        None => break,
                    }
                }
            }
        } else {
            inner.order.retain(|k| k != key);
        }
        inner.order.push_back(key.to_string());
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        inner.order.retain(|k| k != key);
        inner.entries.remove(key).map(|e| e.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.contains_at(key, Instant::now())
    }

    pub fn contains_at(&self, key: &str, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap();
        self.expire_key(&mut inner, key, now);
        inner.entries.contains_key(key)
    }

    /// Number of live entries. Sweeps everything expired first.
    pub fn len_at(&self, now: Instant) -> usize {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, e| now.duration_since(e.inserted_at) <= ttl);
        let entries = &inner.entries;
        inner.order.retain(|k| entries.contains_key(k));
        inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.len_at(Instant::now())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expire_key(&self, inner: &mut Inner<V>, key: &str, now: Instant) {
        let expired = inner
            .entries
            .get(key)
            .is_some_and(|e| now.duration_since(e.inserted_at) > self.ttl);
        if expired {
            inner.entries.remove(key);
            inner.order.retain(|k| k != key);
        }
    }
}

impl<V: Clone> ExpiringMap<V> {
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Read with lazy expiry: an entry past its TTL is evicted and reported
    /// absent.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut inner = self.inner.lock().unwrap();
        self.expire_key(&mut inner, key, now);
        inner.entries.get(key).map(|e| e.value.clone())
    }
}

impl ExpiringMap<i64> {
    pub fn increment(&self, key: &str) -> i64 {
        self.increment_at(key, Instant::now())
    }

    /// Add one to the counter under `key`, creating it at 1 when absent or
    /// expired. An increment after a quiet gap therefore restarts at 1
    /// instead of continuing a stale count. Incrementing re-inserts the
    /// entry, so its age and queue position are refreshed and the window
    /// slides with the most recent occurrence.
    pub fn increment_at(&self, key: &str, now: Instant) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        self.expire_key(&mut inner, key, now);
        let next = inner.entries.get(key).map_or(1, |e| e.value + 1);
        self.insert_locked(&mut inner, key, next, now);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    fn later(now: Instant, secs: u64) -> Instant {
        now + Duration::from_secs(secs)
    }

    #[test]
    fn test_get_put_roundtrip() {
        let map: ExpiringMap<i64> = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.put_at("a", 7, now);
        assert_eq!(map.get_at("a", now), Some(7));
        assert_eq!(map.get_at("b", now), None);
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let map: ExpiringMap<i64> = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.put_at("a", 7, now);
        assert_eq!(map.get_at("a", later(now, 10)), Some(7));
        assert_eq!(map.get_at("a", later(now, 11)), None);
        // Physically gone, not just hidden
        assert_eq!(map.len_at(later(now, 11)), 0);
    }

    #[test]
    fn test_increment_creates_and_counts() {
        let map = ExpiringMap::new(TTL);
        let now = Instant::now();
        assert_eq!(map.increment_at("x", now), 1);
        assert_eq!(map.increment_at("x", now), 2);
        assert_eq!(map.increment_at("x", later(now, 5)), 3);
    }

    #[test]
    fn test_increment_refreshes_window() {
        let map = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.increment_at("x", now);
        assert_eq!(map.increment_at("x", later(now, 9)), 2);
        // The window is anchored at the latest occurrence, not the first:
        // 18s after creation but only 9s after the last increment.
        assert_eq!(map.increment_at("x", later(now, 18)), 3);
        assert_eq!(map.get_at("x", later(now, 29)), None);
    }

    #[test]
    fn test_increment_restarts_after_gap() {
        let map = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.increment_at("x", now);
        map.increment_at("x", now);
        // Gap longer than TTL: count restarts at 1, not 3
        assert_eq!(map.increment_at("x", later(now, 11)), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let map: ExpiringMap<i64> = ExpiringMap::with_max_len(TTL, 2);
        let now = Instant::now();
        map.put_at("a", 1, now);
        map.put_at("b", 2, now);
        // "a" was touched most recently by get, but eviction is by insertion
        // order, so "a" still goes first.
        assert_eq!(map.get_at("a", now), Some(1));
        map.put_at("c", 3, now);
        assert_eq!(map.get_at("a", now), None);
        assert_eq!(map.get_at("b", now), Some(2));
        assert_eq!(map.get_at("c", now), Some(3));
    }

    #[test]
    fn test_reinsert_moves_to_back_of_queue() {
        let map: ExpiringMap<i64> = ExpiringMap::with_max_len(TTL, 2);
        let now = Instant::now();
        map.put_at("a", 1, now);
        map.put_at("b", 2, now);
        map.put_at("a", 10, now);
        map.put_at("c", 3, now);
        // "b" is now the oldest insertion and gets evicted
        assert_eq!(map.get_at("b", now), None);
        assert_eq!(map.get_at("a", now), Some(10));
    }

    #[test]
    fn test_reinsert_refreshes_age() {
        let map: ExpiringMap<i64> = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.put_at("a", 1, now);
        map.put_at("a", 2, later(now, 8));
        assert_eq!(map.get_at("a", later(now, 15)), Some(2));
        assert_eq!(map.get_at("a", later(now, 19)), None);
    }

    #[test]
    fn test_remove() {
        let map: ExpiringMap<()> = ExpiringMap::new(TTL);
        let now = Instant::now();
        map.put_at("a", (), now);
        assert!(map.contains_at("a", now));
        map.remove("a");
        assert!(!map.contains_at("a", now));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;
        let map: Arc<ExpiringMap<i64>> = Arc::new(ExpiringMap::new(TTL));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let map = Arc::clone(&map);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    map.increment("shared");
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(map.get("shared"), Some(400));
    }
}
