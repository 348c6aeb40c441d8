pub mod aggregations;
pub mod cache;
pub mod config;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod request;
pub mod service;

pub use aggregations::{
    Bucket, BucketBoundaries, BucketingParams, DependentField, DiscreteValue, FacetResult,
    NumericFacetResult, NumericValueDetails,
};
pub use cache::{BucketCache, CachedParametricValuesService};
pub use config::Config;
pub use error::{Error, Result};
pub use fields::{FieldDisplayNormalizer, FieldPath, FieldResolver};
pub use gateway::BackendValueGateway;
pub use request::{ParametricRequest, QueryRestrictions, SortOrder};
pub use service::{ParametricValues, ParametricValuesService};
