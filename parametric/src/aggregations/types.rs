use crate::fields::FieldPath;
use serde::{Deserialize, Serialize};

/// One discrete value of a parametric field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscreteValue {
    pub value: String,
    pub display_value: String,
    pub count: u64,
}

impl DiscreteValue {
    pub fn new(value: impl Into<String>, display_value: impl Into<String>, count: u64) -> Self {
        Self {
            value: value.into(),
            display_value: display_value.into(),
            count,
        }
    }
}

/// Discrete values of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    pub field: FieldPath,
    pub display_name: String,
    pub values: Vec<DiscreteValue>,
}

impl FacetResult {
    pub fn value(&self, value: &str) -> Option<&DiscreteValue> {
        self.values.iter().find(|v| v.value == value)
    }
}

/// One numeric sub-range `[lower_bound, upper_bound)` and its document count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub count: u64,
}

impl Bucket {
    pub fn new(lower_bound: f64, upper_bound: f64, count: u64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            count,
        }
    }

    pub fn empty(lower_bound: f64, upper_bound: f64) -> Self {
        Self::new(lower_bound, upper_bound, 0)
    }
}

/// Histogram of a numeric field.
///
/// `total_count` is reported by the backend independently of the buckets and
/// is not required to equal the sum of bucket counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFacetResult {
    pub field: FieldPath,
    pub display_name: String,
    pub total_count: u64,
    pub min: f64,
    pub max: f64,
    pub buckets: Vec<Bucket>,
}

impl NumericFacetResult {
    pub fn bucketed_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn non_empty_buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter().filter(|b| b.count > 0)
    }
}

/// Statistics describing a numeric field's values among matching documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericValueDetails {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub sum: f64,
    pub total_values: u64,
}

/// A value of one field together with the values of the next field that
/// occur in documents carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentField {
    pub field: FieldPath,
    pub value: String,
    pub display_value: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DependentField>,
}

impl DependentField {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DependentField::node_count).sum::<usize>()
    }
}
