//! Discrete value aggregation.
//!
//! Turns the raw `(value, count)` lists reported by the backend into facet
//! results: dedupe, filter, optional sort, truncate, drop empty fields and
//! attach display names.

use super::pattern::ValuePatterns;
use super::types::{DiscreteValue, FacetResult};
use crate::error::{Error, Result};
use crate::fields::{FieldDisplayNormalizer, FieldPath};
use crate::gateway::RawFieldValues;
use crate::request::{ParametricRequest, SortOrder};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Per-request aggregation settings.
#[derive(Debug, Clone, Default)]
pub struct AggregationOptions {
    pub max_values: Option<usize>,
    pub sort: Option<SortOrder>,
    pub patterns: ValuePatterns,
}

impl AggregationOptions {
    pub fn from_request(request: &ParametricRequest) -> Result<Self> {
        Ok(Self {
            max_values: request.max_values,
            sort: request.sort,
            patterns: ValuePatterns::compile(&request.value_restrictions)?,
        })
    }
}

pub struct ValueAggregator<'a> {
    normalizer: &'a dyn FieldDisplayNormalizer,
    options: &'a AggregationOptions,
}

impl<'a> ValueAggregator<'a> {
    pub fn new(normalizer: &'a dyn FieldDisplayNormalizer, options: &'a AggregationOptions) -> Self {
        Self { normalizer, options }
    }

    /// Aggregate raw field values, preserving backend field order.
    pub fn aggregate(&self, raw: &[RawFieldValues]) -> Result<Vec<FacetResult>> {
        let mut seen_fields = HashSet::with_capacity(raw.len());
        let mut results = Vec::with_capacity(raw.len());

        for field_values in raw {
            let field = FieldPath::parse(&field_values.field).map_err(|e| {
                Error::backend("malformed field name in parametric values response", e.to_string())
            })?;

            if !seen_fields.insert(field.clone()) {
                continue;
            }

            let values = self.aggregate_field(&field, field_values);
            if values.is_empty() {
                continue;
            }

            results.push(FacetResult {
                display_name: self.normalizer.display_name(&field),
                field,
                values,
            });
        }

        Ok(results)
    }

    fn aggregate_field(&self, field: &FieldPath, raw: &RawFieldValues) -> Vec<DiscreteValue> {
        let mut seen = HashSet::with_capacity(raw.values.len());
        let mut values: Vec<DiscreteValue> = raw
            .values
            .iter()
            .filter(|v| seen.insert(v.value.as_str()))
            .filter(|v| self.options.patterns.admits(&v.value))
            .map(|v| {
                DiscreteValue::new(
                    v.value.clone(),
                    self.normalizer.display_value(field, &v.value),
                    v.count,
                )
            })
            .collect();

        if let Some(sort) = self.options.sort {
            sort_values(&mut values, sort);
        }

        if let Some(max) = self.options.max_values {
            values.truncate(max);
        }

        values
    }
}

/// Stable sort of discrete values.
pub fn sort_values(values: &mut [DiscreteValue], sort: SortOrder) {
    match sort {
        SortOrder::Alphabetical => values.sort_by(|a, b| alphabetical(&a.value, &b.value)),
        SortOrder::ReverseAlphabetical => values.sort_by(|a, b| alphabetical(&b.value, &a.value)),
        SortOrder::DocumentCount => values.sort_by(|a, b| b.count.cmp(&a.count)),
        SortOrder::NumberIncreasing => values.sort_by(|a, b| numeric(&a.value, &b.value)),
        SortOrder::NumberDecreasing => values.sort_by(|a, b| numeric(&b.value, &a.value)),
        SortOrder::Off => {}
    }
}

fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// Values that do not parse as numbers sort after all numbers.
fn numeric(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
