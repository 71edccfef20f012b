//! Field report cache and in-flight request coalescing.
//!
//! ## Cache Key
//!
//! Field reports are cached by dataset id, field name and a checksum of the
//! bounded sample together with the field's declared context. A changed
//! value, type or sibling set gives a new key, so stale reports are never
//! served.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use moka::future::Cache;
use tokio::sync::OnceCell;

use crate::schema::FieldReport;

/// Cache key for one field report.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct FieldKey {
    pub dataset_id: String,
    pub field: String,
    pub checksum: String,
}

impl FieldKey {
    pub fn new(
        dataset_id: impl Into<String>,
        field: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            field: field.into(),
            checksum: checksum.into(),
        }
    }
}

/// Bounded store of computed field reports.
///
/// Concurrent requests for the same key run the computation once; every
/// caller receives the result.
#[derive(Clone)]
pub struct FieldCache {
    inner: Cache<FieldKey, FieldReport>,
}

impl FieldCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Get a report, or compute and cache it.
    ///
    /// A failed computation is returned to every waiting caller and is not
    /// cached.
    pub async fn get_or_compute<Fut>(
        &self,
        key: FieldKey,
        compute: Fut,
    ) -> Result<FieldReport, Arc<String>>
    where
        Fut: Future<Output = Result<FieldReport, String>>,
    {
        self.inner.try_get_with(key, compute).await
    }

    pub async fn get(&self, key: &FieldKey) -> Option<FieldReport> {
        self.inner.get(key).await
    }

    /// Drop every cached report of a dataset.
    pub fn invalidate_dataset(&self, dataset_id: &str) {
        let dataset_id = dataset_id.to_string();
        // Cannot fail: the builder enables invalidation closures.
        let _ = self
            .inner
            .invalidate_entries_if(move |key, _| key.dataset_id == dataset_id);
    }
}

/// Single-flight execution: concurrent calls with the same key share one
/// run of the work and its result. Entries live only while the work runs.
pub struct InFlight<K, V> {
    running: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

/// A caller's hold on an in-flight entry. Dropping the last hold, or any
/// hold once the value is set, removes the entry.
struct Hold<'a, K: Hash + Eq, V> {
    running: &'a Mutex<HashMap<K, Arc<OnceCell<V>>>>,
    key: K,
    cell: Arc<OnceCell<V>>,
}

impl<K: Hash + Eq, V> Drop for Hold<'_, K, V> {
    fn drop(&mut self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        let ours = running
            .get(&self.key)
            .is_some_and(|c| Arc::ptr_eq(c, &self.cell));
        // The map and this hold account for two references.
        if ours && (self.cell.initialized() || Arc::strong_count(&self.cell) <= 2) {
            running.remove(&self.key);
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` unless a run for `key` is already in flight, in which case
    /// wait for that run's result instead.
    ///
    /// If the caller driving the work is dropped, a waiting caller takes
    /// over with its own `work`.
    pub async fn run<F, Fut>(&self, key: K, work: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let hold = {
            let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
            let cell = running.entry(key.clone()).or_default().clone();
            Hold {
                running: &self.running,
                key,
                cell,
            }
        };

        hold.cell.get_or_init(work).await.clone()
    }

    /// Number of keys currently running.
    pub fn len(&self) -> usize {
        self.running.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for InFlight<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::schema::{FieldDescriptor, FieldType, UnscoredReason};

    fn report(name: &str) -> FieldReport {
        FieldReport::unscored(
            FieldDescriptor::new(name, FieldType::String),
            UnscoredReason::EmptySample,
        )
    }

    #[tokio::test]
    async fn test_cache_hit_skips_computation() {
        let cache = FieldCache::new(10);
        let key = FieldKey::new("ds", "f", "sha256:1");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_compute(key.clone(), async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(report("f"))
                })
                .await
                .unwrap();
            assert_eq!(got.name(), "f");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = FieldCache::new(10);
        let key = FieldKey::new("ds", "f", "sha256:1");

        let failed = cache
            .get_or_compute(key.clone(), async { Err("boom".to_string()) })
            .await;
        assert_eq!(failed.unwrap_err().as_str(), "boom");
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_checksum_separates_entries() {
        let cache = FieldCache::new(10);
        cache
            .get_or_compute(FieldKey::new("ds", "f", "a"), async { Ok(report("a")) })
            .await
            .unwrap();
        let other = cache
            .get_or_compute(FieldKey::new("ds", "f", "b"), async { Ok(report("b")) })
            .await
            .unwrap();
        assert_eq!(other.name(), "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_coalesces() {
        let in_flight: InFlight<String, usize> = InFlight::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let work = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let (a, b) = tokio::join!(
            in_flight.run("k".to_string(), work),
            in_flight.run("k".to_string(), work)
        );
        assert_eq!((a, b), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(in_flight.is_empty());

        // A later call after completion runs again.
        in_flight.run("k".to_string(), work).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_run_leaves_no_entry() {
        let in_flight: InFlight<String, usize> = InFlight::new();
        let work = || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), in_flight.run("k".to_string(), work))
                .await;
        assert!(abandoned.is_err());
        assert!(in_flight.is_empty());

        assert_eq!(in_flight.run("k".to_string(), work).await, 7);
        assert!(in_flight.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_takes_over_abandoned_run() {
        let in_flight: InFlight<String, usize> = InFlight::new();
        let work = || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            7
        };

        let (first, second) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(10), in_flight.run("k".to_string(), work)),
            in_flight.run("k".to_string(), work)
        );
        assert!(first.is_err());
        assert_eq!(second, 7);
        assert!(in_flight.is_empty());
    }
}
