//! Backend value gateway.
//!
//! The search backend is reachable only through a narrow query/response
//! protocol. A gateway maps that protocol onto the tuples below; the engine
//! never sees backend-native response shapes.
//!
//! Gateways own retry and timeout policy. The engine calls each operation at
//! most once per request and forwards failures unchanged.

mod memory;

pub use memory::{InMemoryGateway, MemoryDocument};

use crate::aggregations::BucketBoundaries;
use crate::error::{Error, Result};
use crate::fields::FieldPath;
use crate::request::{ParametricRequest, QueryRestrictions, SortOrder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query context forwarded to the backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendQuery<'a> {
    pub restrictions: &'a QueryRestrictions,
    /// Apply the backend's query manipulation
    pub modified: bool,
}

impl<'a> BackendQuery<'a> {
    pub fn new(restrictions: &'a QueryRestrictions) -> Self {
        Self {
            restrictions,
            modified: false,
        }
    }

    pub fn from_request(request: &'a ParametricRequest) -> Self {
        Self {
            restrictions: &request.query_restrictions,
            modified: request.modified,
        }
    }
}

/// Value and document count as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawValue {
    pub value: String,
    pub count: u64,
}

impl RawValue {
    pub fn new(value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// Discrete values of one field. `field` is the backend's own name or path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldValues {
    pub field: String,
    #[serde(default)]
    pub values: Vec<RawValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawRange {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub count: u64,
}

impl RawRange {
    pub fn new(lower_bound: f64, upper_bound: f64, count: u64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            count,
        }
    }
}

/// Range counts of one field plus the field's overall document count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFieldRanges {
    pub field: String,
    pub count: u64,
    #[serde(default)]
    pub ranges: Vec<RawRange>,
}

/// Domain statistics of a numeric field among matching documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDomain {
    pub field: String,
    pub count: u64,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub average: f64,
    #[serde(default)]
    pub sum: f64,
}

/// Boundary grid requested for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBoundaries {
    pub field: FieldPath,
    pub boundaries: BucketBoundaries,
}

/// Hierarchical value node as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependentValue {
    pub field: String,
    pub value: String,
    pub count: u64,
    #[serde(default)]
    pub children: Vec<RawDependentValue>,
}

#[async_trait]
pub trait BackendValueGateway: Send + Sync {
    /// Per-field value lists. A gateway that truncates to `max_values` must
    /// apply `value_patterns` first. Fields with no values may be returned
    /// with an empty list.
    async fn fetch_discrete_values(
        &self,
        query: BackendQuery<'_>,
        fields: &[FieldPath],
        max_values: Option<usize>,
        sort: Option<SortOrder>,
        value_patterns: &[String],
    ) -> Result<Vec<RawFieldValues>>;

    /// Domain statistics per field. Fields without matching numeric data
    /// are omitted.
    async fn describe_field_domains(
        &self,
        query: BackendQuery<'_>,
        fields: &[FieldPath],
    ) -> Result<Vec<FieldDomain>>;

    /// Counts per requested bucket. Fields without matching data are omitted.
    async fn fetch_range_counts(
        &self,
        query: BackendQuery<'_>,
        grids: &[FieldBoundaries],
    ) -> Result<Vec<RawFieldRanges>>;

    /// Values of each field conditioned on the values of the previous one.
    async fn fetch_dependent_values(
        &self,
        _query: BackendQuery<'_>,
        _fields: &[FieldPath],
    ) -> Result<Vec<RawDependentValue>> {
        Err(Error::unsupported(format!(
            "dependent parametric values are not supported by the {} backend",
            self.name()
        )))
    }

    /// Human-readable backend name
    fn name(&self) -> &str;
}
