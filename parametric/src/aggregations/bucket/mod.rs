mod boundaries;
mod params;
mod reconcile;

pub use boundaries::{bucket_size, BucketBoundaries};
pub use params::BucketingParams;
pub use reconcile::{DomainSummary, RangeReconciler};
