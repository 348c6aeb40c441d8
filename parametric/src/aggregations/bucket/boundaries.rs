//! Bucket boundary generation.
//!
//! Boundaries start at `floor(min)` and advance by
//! `ceil((max - min + 1) / target)` until the first value beyond `max`.
//! Buckets are half-open `[lower, upper)` except the last one, which also
//! includes its upper boundary. Comparisons use plain `<=`/`<` so the grid
//! lines up with the backend's own range matching.

use super::params::BucketingParams;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Strictly increasing bucket edges with at least two entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketBoundaries(Vec<f64>);

impl BucketBoundaries {
    /// Compute the grid for a numeric domain.
    pub fn generate(min: f64, max: f64, target_bucket_count: u32) -> Result<Self> {
        if target_bucket_count == 0 {
            return Err(Error::invalid_argument("must request at least one bucket"));
        }
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::invalid_argument(format!(
                "malformed field domain: bounds must be finite, got [{}, {}]",
                min, max
            )));
        }
        if max < min {
            return Err(Error::invalid_argument(format!(
                "malformed field domain: max {} is below min {}",
                max, min
            )));
        }

        let bucket_size = bucket_size(min, max, target_bucket_count);
        if !bucket_size.is_finite() {
            return Err(Error::invalid_argument(format!(
                "malformed field domain: [{}, {}] is too wide to bucket",
                min, max
            )));
        }

        let mut value = min.floor();
        // The domain width bounds the edge count, not the requested target.
        let expected = ((max - value) / bucket_size) as usize + 2;
        let mut boundaries = Vec::with_capacity(expected.min(target_bucket_count as usize + 1));
        boundaries.push(value);

        loop {
            let next = value + bucket_size;
            if next <= value {
                return Err(Error::invalid_argument(format!(
                    "malformed field domain: bucket size {} vanishes at {}",
                    bucket_size, value
                )));
            }
            value = next;
            boundaries.push(value);
            if value > max {
                break;
            }
        }

        Ok(Self(boundaries))
    }

    pub fn for_params(params: &BucketingParams) -> Result<Self> {
        Self::generate(params.min(), params.max(), params.target_bucket_count())
    }

    /// Wrap an existing edge list, checking it is usable as a grid.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::invalid_argument("a bucket grid needs at least two boundaries"));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::invalid_argument(
                "bucket boundaries must be finite and strictly increasing",
            ));
        }
        Ok(Self(edges))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Adjacent `(lower, upper)` pairs in ascending order.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    /// Index of the bucket holding `value`, if any.
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        let last = self.last();
        self.pairs()
            .position(|(lower, upper)| lower <= value && (value < upper || (value == last && upper == last)))
    }
}

/// Width of every bucket in the grid; always rounded up.
pub fn bucket_size(min: f64, max: f64, target_bucket_count: u32) -> f64 {
    ((max - min + 1.0) / f64::from(target_bucket_count)).ceil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bucket_size_rounds_up() {
        assert_eq!(bucket_size(3.0, 12.0, 9), 2.0);
        assert_eq!(bucket_size(0.0, 9.0, 10), 1.0);
        assert_eq!(bucket_size(5.0, 5.0, 1), 1.0);
    }

    #[test]
    fn test_generate_grid() {
        let grid = BucketBoundaries::generate(3.0, 12.0, 9).unwrap();
        assert_eq!(grid.as_slice(), &[3.0, 5.0, 7.0, 9.0, 11.0, 13.0]);
        assert_eq!(grid.bucket_count(), 5);
    }

    #[test]
    fn test_generate_floors_min() {
        let grid = BucketBoundaries::generate(1.5, 5.5, 3).unwrap();
        // size = ceil(5 / 3) = 2
        assert_eq!(grid.as_slice(), &[1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_degenerate_domain_single_bucket() {
        let grid = BucketBoundaries::generate(4.0, 4.0, 5).unwrap();
        assert_eq!(grid.as_slice(), &[4.0, 5.0]);
    }

    #[test]
    fn test_huge_bucket_count_over_narrow_domain() {
        let grid = BucketBoundaries::generate(4.0, 4.0, u32::MAX).unwrap();
        assert_eq!(grid.as_slice(), &[4.0, 5.0]);

        let grid = BucketBoundaries::generate(0.0, 1.0, u32::MAX).unwrap();
        assert_eq!(grid.as_slice(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_even_division_keeps_trailing_bucket() {
        // (9 - 0 + 1) / 10 divides evenly; the grid still ends past max.
        let grid = BucketBoundaries::generate(0.0, 9.0, 10).unwrap();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid.last(), 10.0);
    }

    #[test]
    fn test_malformed_domain() {
        assert!(BucketBoundaries::generate(5.0, 1.0, 3).unwrap_err().is_invalid_argument());
        assert!(BucketBoundaries::generate(f64::NAN, 1.0, 3).is_err());
        assert!(BucketBoundaries::generate(0.0, 1.0, 0).is_err());
        assert!(BucketBoundaries::generate(-f64::MAX, f64::MAX, 2).is_err());
    }

    #[test]
    fn test_vanishing_step_rejected() {
        // At 1e17 adding 1.0 no longer changes the value.
        assert!(BucketBoundaries::generate(1e17, 1e17 + 4.0, 1000).is_err());
    }

    #[test]
    fn test_from_edges_validation() {
        assert!(BucketBoundaries::from_edges(vec![1.0]).is_err());
        assert!(BucketBoundaries::from_edges(vec![1.0, 1.0]).is_err());
        assert!(BucketBoundaries::from_edges(vec![1.0, f64::NAN]).is_err());
        assert!(BucketBoundaries::from_edges(vec![0.0, 1.0, 3.0]).is_ok());
    }

    #[test]
    fn test_bucket_index_half_open_last_closed() {
        let grid = BucketBoundaries::from_edges(vec![0.0, 2.0, 4.0]).unwrap();
        assert_eq!(grid.bucket_index(0.0), Some(0));
        assert_eq!(grid.bucket_index(1.99), Some(0));
        assert_eq!(grid.bucket_index(2.0), Some(1));
        assert_eq!(grid.bucket_index(4.0), Some(1));
        assert_eq!(grid.bucket_index(4.01), None);
        assert_eq!(grid.bucket_index(-0.5), None);
    }

    proptest! {
        #[test]
        fn prop_boundaries_cover_domain(
            n in 1u32..200,
            min in -10_000.0f64..10_000.0,
            width in 0.0f64..50_000.0,
        ) {
            let max = min + width;
            let grid = BucketBoundaries::generate(min, max, n).unwrap();
            let edges = grid.as_slice();

            prop_assert!(edges.len() >= 2);
            prop_assert!(edges.len() <= n as usize + 1);
            prop_assert_eq!(edges[0], min.floor());
            prop_assert!(grid.last() > max);
            prop_assert!(edges.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
