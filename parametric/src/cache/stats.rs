//! Outcome counters for bucket cache lookups.
//!
//! Every lookup ends in one [`Lookup`] outcome. Outcomes are mirrored to the
//! `parametric_cache_lookups_total` counter, labelled by outcome, and
//! evictions to `parametric_cache_evictions_total`.

use std::sync::atomic::{AtomicU64, Ordering};

/// How a single `get_or_compute` call was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Served from a stored result, or by joining a computation another
    /// caller had already started.
    Hit,
    /// This caller ran the backend computation and stored its result.
    Computed,
    /// The computation failed; nothing was stored.
    Failed,
}

impl Lookup {
    fn label(self) -> &'static str {
        match self {
            Lookup::Hit => "hit",
            Lookup::Computed => "computed",
            Lookup::Failed => "failed",
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    computed: AtomicU64,
    failed: AtomicU64,
    evictions: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, outcome: Lookup) {
        let counter = match outcome {
            Lookup::Hit => &self.hits,
            Lookup::Computed => &self.computed,
            Lookup::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("parametric_cache_lookups_total", "outcome" => outcome.label()).increment(1);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("parametric_cache_evictions_total").increment(1);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that had to compute, whether or not the computation succeeded.
    pub fn misses(&self) -> u64 {
        self.computed.load(Ordering::Relaxed) + self.failures()
    }

    pub fn failures(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn total_requests(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Share of lookups that avoided a backend round trip.
    pub fn hit_rate(&self) -> f64 {
        match self.total_requests() {
            0 => 0.0,
            total => self.hits() as f64 / total as f64,
        }
    }
}
