//! TTL-bounded read-through cache for the backing tables.
//!
//! # Responsibilities
//! - Serve the cached snapshot while it is younger than the TTL
//! - Reload through the supplied loader once the TTL has elapsed
//! - Replace a failed load with the empty snapshot and report it
//!
//! # Design Decisions
//! - The timestamp advances on failure too, so a broken store is retried
//!   at most once per TTL window
//! - No lock is held across the loader; concurrent misses may all reload
//! - Time comes from an injected [`Clock`]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::store::StoreError;

/// Millisecond wall clock.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Monotonic clock counting milliseconds since construction.
///
/// Unaffected by wall-clock steps, so snapshot age never shrinks.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cacheable table snapshot.
pub trait Snapshot: Default + Send + Sync {
    /// Number of entries, reported on reload.
    fn entries(&self) -> usize;
}

impl<T: Send + Sync> Snapshot for Vec<T> {
    fn entries(&self) -> usize {
        self.len()
    }
}

/// Receives cache reload outcomes.
pub trait LoadObserver: Send + Sync {
    /// A table was reloaded successfully.
    fn reloaded(&self, table: &str, entries: usize);

    /// A table load failed and was replaced by the empty snapshot.
    fn load_failed(&self, table: &str, error: &StoreError);
}

/// Default observer: structured log events plus counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LoadObserver for TracingObserver {
    fn reloaded(&self, table: &str, entries: usize) {
        tracing::debug!(table = %table, entries, "Table reloaded");
        metrics::record_table_reload(table, entries);
    }

    fn load_failed(&self, table: &str, error: &StoreError) {
        tracing::warn!(table = %table, error = %error, "Table load failed, serving empty table");
        metrics::record_table_failure(table);
    }
}

struct CacheEntry<T> {
    loaded_at: u64,
    value: Arc<T>,
}

/// Single-table TTL cache.
///
/// Starts empty, so the first `get` always loads.
pub struct TtlCache<T> {
    table: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn LoadObserver>,
    entry: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Snapshot> TtlCache<T> {
    pub fn new(
        table: &'static str,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn LoadObserver>,
    ) -> Self {
        Self {
            table,
            ttl,
            clock,
            observer,
            entry: RwLock::new(None),
        }
    }

    /// Return the cached snapshot, reloading through `loader` when stale.
    ///
    /// Loader errors are reported to the observer and replaced by
    /// `T::default()`; they are never returned.
    pub fn get<F>(&self, loader: F) -> Arc<T>
    where
        F: FnOnce() -> Result<T, StoreError>,
    {
        let now = self.clock.now_millis();
        if let Some(value) = self.fresh(now) {
            return value;
        }

        let value = match loader() {
            Ok(value) => {
                self.observer.reloaded(self.table, value.entries());
                Arc::new(value)
            }
            Err(e) => {
                self.observer.load_failed(self.table, &e);
                Arc::new(T::default())
            }
        };

        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        *entry = Some(CacheEntry {
            loaded_at: now,
            value: value.clone(),
        });
        value
    }

    /// Age of the current snapshot, if one has been loaded.
    pub fn age(&self) -> Option<Duration> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        entry.as_ref().map(|e| {
            Duration::from_millis(self.clock.now_millis().saturating_sub(e.loaded_at))
        })
    }

    fn fresh(&self, now: u64) -> Option<Arc<T>> {
        let entry = self.entry.read().unwrap_or_else(|e| e.into_inner());
        let entry = entry.as_ref()?;
        let age = now.saturating_sub(entry.loaded_at);
        (u128::from(age) < self.ttl.as_millis()).then(|| entry.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        reloads: AtomicUsize,
        failures: Mutex<Vec<String>>,
    }

    impl LoadObserver for RecordingObserver {
        fn reloaded(&self, _table: &str, _entries: usize) {
            self.reloads.fetch_add(1, Ordering::SeqCst);
        }

        fn load_failed(&self, table: &str, _error: &StoreError) {
            self.failures.lock().unwrap().push(table.to_string());
        }
    }

    fn cache(clock: Arc<ManualClock>, observer: Arc<RecordingObserver>) -> TtlCache<Vec<u32>> {
        TtlCache::new("test", Duration::from_millis(5000), clock, observer)
    }

    fn malformed() -> StoreError {
        StoreError::Malformed(serde_json::from_str::<Vec<u32>>("{").unwrap_err())
    }

    #[test]
    fn test_first_get_loads_even_at_time_zero() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(clock, Arc::default());

        assert!(cache.age().is_none());
        let value = cache.get(|| Ok(vec![1]));
        assert_eq!(*value, vec![1]);
        assert_eq!(cache.age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_serves_stale_value_within_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let observer = Arc::new(RecordingObserver::default());
        let cache = cache(clock.clone(), observer.clone());

        assert_eq!(*cache.get(|| Ok(vec![1])), vec![1]);

        clock.advance(Duration::from_millis(4_999));
        let calls = AtomicUsize::new(0);
        let value = cache.get(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![2])
        });
        assert_eq!(*value, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(observer.reloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reloads_after_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = cache(clock.clone(), Arc::default());

        cache.get(|| Ok(vec![1]));
        clock.advance(Duration::from_millis(5_000));
        assert_eq!(*cache.get(|| Ok(vec![2])), vec![2]);
    }

    #[test]
    fn test_failure_is_absorbed_and_not_retried_within_ttl() {
        let clock = Arc::new(ManualClock::new(1_000));
        let observer = Arc::new(RecordingObserver::default());
        let cache = cache(clock.clone(), observer.clone());

        let value = cache.get(|| Err(malformed()));
        assert!(value.is_empty());
        assert_eq!(*observer.failures.lock().unwrap(), vec!["test".to_string()]);

        clock.advance(Duration::from_millis(100));
        let calls = AtomicUsize::new(0);
        let value = cache.get(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![9])
        });
        assert!(value.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_millis(5_000));
        assert_eq!(*cache.get(|| Ok(vec![9])), vec![9]);
    }

    #[test]
    fn test_failure_replaces_previous_value() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache(clock.clone(), Arc::default());

        cache.get(|| Ok(vec![1, 2]));
        clock.set(10_000);
        assert!(cache.get(|| Err(malformed())).is_empty());
    }

    #[test]
    fn test_monotonic_clock_starts_at_zero_and_never_goes_back() {
        let clock = MonotonicClock::new();
        let first = clock.now_millis();
        assert!(first < 1_000);

        std::thread::sleep(Duration::from_millis(5));
        let second = clock.now_millis();
        assert!(second >= first + 5);
    }

    #[test]
    fn test_monotonic_clock_drives_ttl() {
        let cache: TtlCache<Vec<u32>> = TtlCache::new(
            "test",
            Duration::from_millis(200),
            Arc::new(MonotonicClock::new()),
            Arc::new(TracingObserver),
        );

        assert_eq!(*cache.get(|| Ok(vec![1])), vec![1]);
        assert_eq!(*cache.get(|| Ok(vec![2])), vec![1]);
        std::thread::sleep(Duration::from_millis(250));
        assert_eq!(*cache.get(|| Ok(vec![3])), vec![3]);
    }

    #[test]
    fn test_zero_ttl_always_reloads() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlCache<Vec<u32>> =
            TtlCache::new("test", Duration::ZERO, clock, Arc::new(TracingObserver));

        cache.get(|| Ok(vec![1]));
        assert_eq!(*cache.get(|| Ok(vec![2])), vec![2]);
    }
}
