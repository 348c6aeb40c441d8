//! Memoization of bucketed numeric results.
//!
//! Computing histograms costs two backend round trips, and the same
//! histogram is typically requested again by every page render of a search
//! result. [`CachedParametricValuesService`] wraps any [`ParametricValues`]
//! implementation and memoizes `get_numeric_values_in_buckets`:
//!
//! - at most one computation runs per key at a time; concurrent callers wait
//!   for it and share its result
//! - failed computations are not cached
//! - the least recently used entry is evicted once `max_entries` is reached
//!
//! The other operations are passed through unchanged.

mod key;
mod stats;

pub use key::CacheKey;
pub use stats::{CacheStats, Lookup};

use crate::aggregations::{
    BucketingParams, DependentField, FacetResult, NumericFacetResult, NumericValueDetails,
};
use crate::error::Result;
use crate::fields::FieldPath;
use crate::request::ParametricRequest;
use crate::service::ParametricValues;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

type Cell = Arc<OnceCell<Vec<NumericFacetResult>>>;

struct Slot {
    cell: Cell,
    last_accessed: u64,
}

/// LRU store of bucketed results, shareable between decorators serving
/// different caller scopes.
pub struct BucketCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    max_entries: usize,
    access_counter: AtomicU64,
    stats: Arc<CacheStats>,
}

impl BucketCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
            access_counter: AtomicU64::new(0),
            stats: Arc::new(CacheStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn entry_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Return the cached value for `key`, running `compute` when there is
    /// none. Callers arriving while a computation is in flight wait for it.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<Vec<NumericFacetResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<NumericFacetResult>>>,
    {
        let cell = self.slot(&key);

        if let Some(value) = cell.get() {
            self.stats.record(Lookup::Hit);
            return Ok(value.clone());
        }

        let computed = AtomicBool::new(false);
        let outcome = cell
            .get_or_try_init(|| {
                computed.store(true, Ordering::Relaxed);
                compute()
            })
            .await;

        match outcome {
            Ok(value) => {
                if computed.load(Ordering::Relaxed) {
                    self.stats.record(Lookup::Computed);
                    debug!(key = %key, "Cached bucketed result");
                } else {
                    self.stats.record(Lookup::Hit);
                }
                Ok(value.clone())
            }
            Err(e) => {
                self.stats.record(Lookup::Failed);
                self.discard_if_empty(&key, &cell);
                Err(e)
            }
        }
    }

    fn slot(&self, key: &CacheKey) -> Cell {
        let access = self.access_counter.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots.lock();

        if let Some(slot) = slots.get_mut(key) {
            slot.last_accessed = access;
            return Arc::clone(&slot.cell);
        }

        // Cells still being filled are never evicted, so later callers join
        // the running computation. With every slot in flight the map grows
        // past capacity until one settles.
        while slots.len() >= self.max_entries {
            let Some(oldest) = slots
                .iter()
                .filter(|(_, slot)| slot.cell.initialized())
                .min_by_key(|(_, slot)| slot.last_accessed)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            slots.remove(&oldest);
            self.stats.record_eviction();
            debug!(key = %oldest, "Evicted bucketed result");
        }

        let cell: Cell = Arc::new(OnceCell::new());
        slots.insert(
            key.clone(),
            Slot {
                cell: Arc::clone(&cell),
                last_accessed: access,
            },
        );
        cell
    }

    fn discard_if_empty(&self, key: &CacheKey, cell: &Cell) {
        let mut slots = self.slots.lock();
        let stale = slots
            .get(key)
            .is_some_and(|slot| Arc::ptr_eq(&slot.cell, cell) && !slot.cell.initialized());
        if stale {
            slots.remove(key);
        }
    }
}

/// Memoizing decorator around a [`ParametricValues`] implementation.
pub struct CachedParametricValuesService<S> {
    inner: S,
    cache: Arc<BucketCache>,
    scope: String,
}

impl<S: ParametricValues> CachedParametricValuesService<S> {
    pub fn new(inner: S, max_entries: usize) -> Self {
        Self::with_cache(inner, Arc::new(BucketCache::new(max_entries)))
    }

    pub fn with_cache(inner: S, cache: Arc<BucketCache>) -> Self {
        Self {
            inner,
            cache,
            scope: String::new(),
        }
    }

    /// Partition cached results by caller, e.g. by security principal.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &Arc<BucketCache> {
        &self.cache
    }

    pub fn stats(&self) -> Arc<CacheStats> {
        self.cache.stats()
    }
}

#[async_trait]
impl<S: ParametricValues> ParametricValues for CachedParametricValuesService<S> {
    async fn get_parametric_values(&self, request: &ParametricRequest) -> Result<Vec<FacetResult>> {
        self.inner.get_parametric_values(request).await
    }

    #[instrument(skip(self, request, params), fields(scope = %self.scope))]
    async fn get_numeric_values_in_buckets(
        &self,
        request: &ParametricRequest,
        params: &HashMap<FieldPath, BucketingParams>,
    ) -> Result<Vec<NumericFacetResult>> {
        let key = CacheKey::for_buckets(&self.scope, request, params)?;
        self.cache
            .get_or_compute(key, || self.inner.get_numeric_values_in_buckets(request, params))
            .await
    }

    async fn get_dependent_values(&self, request: &ParametricRequest) -> Result<Vec<DependentField>> {
        self.inner.get_dependent_values(request).await
    }

    async fn get_numeric_value_details(
        &self,
        request: &ParametricRequest,
    ) -> Result<BTreeMap<FieldPath, NumericValueDetails>> {
        self.inner.get_numeric_value_details(request).await
    }
}
