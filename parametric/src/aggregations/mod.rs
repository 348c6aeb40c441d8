//! Value aggregation and numeric bucketing.

pub mod bucket;
mod pattern;
pub mod types;
mod values;

pub use bucket::{BucketBoundaries, BucketingParams, DomainSummary, RangeReconciler};
pub use pattern::{ValuePattern, ValuePatterns};
pub use types::{
    Bucket, DependentField, DiscreteValue, FacetResult, NumericFacetResult, NumericValueDetails,
};
pub use values::{sort_values, AggregationOptions, ValueAggregator};
