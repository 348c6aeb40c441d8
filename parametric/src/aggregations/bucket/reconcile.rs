//! Reconciles sparse backend range counts with the full boundary grid.
//!
//! Backends only report the ranges they found documents for (or report them
//! with their own bounds). The caller always gets one bucket per grid pair;
//! pairs the backend did not report become zero-count buckets.

use super::boundaries::BucketBoundaries;
use crate::aggregations::types::{Bucket, NumericFacetResult};
use crate::error::{Error, Result};
use crate::fields::FieldPath;
use crate::gateway::RawRange;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Metadata attached to a reconciled histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainSummary {
    pub total_count: u64,
    pub min: f64,
    pub max: f64,
}

/// Map key ordering floats totally. `-0.0` and `0.0` share a key.
#[derive(Debug, Clone, Copy)]
struct LowerBound(f64);

impl LowerBound {
    fn new(value: f64) -> Self {
        Self(value + 0.0)
    }
}

impl PartialEq for LowerBound {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LowerBound {}

impl PartialOrd for LowerBound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LowerBound {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

pub struct RangeReconciler<'a> {
    grid: &'a BucketBoundaries,
}

impl<'a> RangeReconciler<'a> {
    pub fn new(grid: &'a BucketBoundaries) -> Self {
        Self { grid }
    }

    /// Merge reported ranges into the grid, in ascending lower-bound order.
    pub fn buckets(&self, reported: &[RawRange]) -> Result<Vec<Bucket>> {
        let mut buckets: BTreeMap<LowerBound, Bucket> = BTreeMap::new();

        for range in reported {
            if !range.lower_bound.is_finite() || !range.upper_bound.is_finite() {
                return Err(Error::backend(
                    "malformed range in parametric ranges response",
                    format!("non-finite bounds [{}, {})", range.lower_bound, range.upper_bound),
                ));
            }
            if let Entry::Vacant(slot) = buckets.entry(LowerBound::new(range.lower_bound)) {
                slot.insert(Bucket::new(range.lower_bound, range.upper_bound, range.count));
            }
        }

        for (lower, upper) in self.grid.pairs() {
            buckets
                .entry(LowerBound::new(lower))
                .or_insert_with(|| Bucket::empty(lower, upper));
        }

        Ok(buckets.into_values().collect())
    }

    pub fn reconcile(
        &self,
        field: FieldPath,
        display_name: String,
        summary: DomainSummary,
        reported: &[RawRange],
    ) -> Result<NumericFacetResult> {
        Ok(NumericFacetResult {
            field,
            display_name,
            total_count: summary.total_count,
            min: summary.min,
            max: summary.max,
            buckets: self.buckets(reported)?,
        })
    }
}
