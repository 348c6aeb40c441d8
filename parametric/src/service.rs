//! Public entry point of the engine.
//!
//! [`ParametricValuesService`] resolves fields, calls the backend gateway
//! once per operation and shapes the response through the aggregator or the
//! range reconciler. It holds no per-request state and is shared behind an
//! `Arc`.

use crate::aggregations::{
    AggregationOptions, BucketBoundaries, BucketingParams, DependentField, DomainSummary,
    FacetResult, NumericFacetResult, NumericValueDetails, RangeReconciler, ValueAggregator,
};
use crate::error::{Error, Result};
use crate::fields::{FieldDisplayNormalizer, FieldPath, FieldResolver};
use crate::gateway::{BackendQuery, BackendValueGateway, FieldBoundaries, RawDependentValue};
use crate::request::ParametricRequest;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Operations exposed to callers. Implemented by the service itself and by
/// decorators wrapping it.
#[async_trait]
pub trait ParametricValues: Send + Sync {
    /// Discrete values per field, in backend field order.
    async fn get_parametric_values(&self, request: &ParametricRequest) -> Result<Vec<FacetResult>>;

    /// Histograms per field, in the order the caller named the fields.
    async fn get_numeric_values_in_buckets(
        &self,
        request: &ParametricRequest,
        params: &HashMap<FieldPath, BucketingParams>,
    ) -> Result<Vec<NumericFacetResult>>;

    /// Value hierarchy where each level is conditioned on the previous one.
    async fn get_dependent_values(&self, request: &ParametricRequest) -> Result<Vec<DependentField>>;

    async fn get_numeric_value_details(
        &self,
        request: &ParametricRequest,
    ) -> Result<BTreeMap<FieldPath, NumericValueDetails>>;
}

#[async_trait]
impl<T: ParametricValues + ?Sized> ParametricValues for Arc<T> {
    async fn get_parametric_values(&self, request: &ParametricRequest) -> Result<Vec<FacetResult>> {
        (**self).get_parametric_values(request).await
    }

    async fn get_numeric_values_in_buckets(
        &self,
        request: &ParametricRequest,
        params: &HashMap<FieldPath, BucketingParams>,
    ) -> Result<Vec<NumericFacetResult>> {
        (**self).get_numeric_values_in_buckets(request, params).await
    }

    async fn get_dependent_values(&self, request: &ParametricRequest) -> Result<Vec<DependentField>> {
        (**self).get_dependent_values(request).await
    }

    async fn get_numeric_value_details(
        &self,
        request: &ParametricRequest,
    ) -> Result<BTreeMap<FieldPath, NumericValueDetails>> {
        (**self).get_numeric_value_details(request).await
    }
}

pub struct ParametricValuesService {
    resolver: Arc<dyn FieldResolver>,
    gateway: Arc<dyn BackendValueGateway>,
    normalizer: Arc<dyn FieldDisplayNormalizer>,
}

impl ParametricValuesService {
    pub fn new(
        resolver: Arc<dyn FieldResolver>,
        gateway: Arc<dyn BackendValueGateway>,
        normalizer: Arc<dyn FieldDisplayNormalizer>,
    ) -> Self {
        Self {
            resolver,
            gateway,
            normalizer,
        }
    }

    /// Requested fields, or every parametric field when none were named.
    async fn resolve_fields(&self, request: &ParametricRequest) -> Result<Vec<FieldPath>> {
        if !request.field_names.is_empty() {
            return Ok(dedupe(&request.field_names));
        }

        let fields = self
            .resolver
            .parametric_fields()
            .await
            .map_err(|e| e.in_context("resolving parametric fields"))?;
        debug!(count = fields.len(), "Resolved default parametric fields");
        Ok(dedupe(&fields))
    }

    fn dependent_node(&self, raw: RawDependentValue) -> Result<DependentField> {
        let field = FieldPath::parse(&raw.field).map_err(|e| {
            Error::backend("malformed field name in dependent values response", e.to_string())
        })?;
        let children = raw
            .children
            .into_iter()
            .map(|child| self.dependent_node(child))
            .collect::<Result<Vec<_>>>()?;

        Ok(DependentField {
            display_value: self.normalizer.display_value(&field, &raw.value),
            field,
            value: raw.value,
            count: raw.count,
            children,
        })
    }
}

fn dedupe(fields: &[FieldPath]) -> Vec<FieldPath> {
    let mut seen = HashSet::with_capacity(fields.len());
    fields.iter().filter(|f| seen.insert(*f)).cloned().collect()
}

fn record_backend_call(operation: &'static str) {
    metrics::counter!("parametric_backend_requests_total", "operation" => operation).increment(1);
}

#[async_trait]
impl ParametricValues for ParametricValuesService {
    #[instrument(skip(self, request), fields(fields = request.field_names.len()))]
    async fn get_parametric_values(&self, request: &ParametricRequest) -> Result<Vec<FacetResult>> {
        let fields = self.resolve_fields(request).await?;
        if fields.is_empty() {
            debug!("No parametric fields to query");
            return Ok(Vec::new());
        }

        let options = AggregationOptions::from_request(request)?;

        record_backend_call("values");
        let raw = self
            .gateway
            .fetch_discrete_values(
                BackendQuery::from_request(request),
                &fields,
                request.max_values,
                request.sort,
                &request.value_restrictions,
            )
            .await
            .map_err(|e| e.in_context("fetching parametric values"))?;

        let results = ValueAggregator::new(self.normalizer.as_ref(), &options)
            .aggregate(&raw)
            .map_err(|e| e.in_context("fetching parametric values"))?;

        debug!(
            requested = fields.len(),
            returned = results.len(),
            "Aggregated parametric values"
        );
        Ok(results)
    }

    #[instrument(skip(self, request, params), fields(fields = request.field_names.len()))]
    async fn get_numeric_values_in_buckets(
        &self,
        request: &ParametricRequest,
        params: &HashMap<FieldPath, BucketingParams>,
    ) -> Result<Vec<NumericFacetResult>> {
        let fields = dedupe(&request.field_names);
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        // Validate everything before touching the backend.
        let mut windows = HashMap::with_capacity(fields.len());
        for field in &fields {
            let field_params = params.get(field).ok_or_else(|| {
                Error::invalid_argument(format!(
                    "bucketing parameters required for every field; none given for '{}'",
                    field
                ))
            })?;
            let grid = BucketBoundaries::for_params(field_params)?;
            windows.insert(field.clone(), (*field_params, grid));
        }

        let query = BackendQuery::from_request(request);

        record_backend_call("describe");
        let domains = self
            .gateway
            .describe_field_domains(query, &fields)
            .await
            .map_err(|e| e.in_context("describing numeric fields"))?;

        let mut described = HashSet::with_capacity(domains.len());
        for domain in &domains {
            let field = FieldPath::parse(&domain.field).map_err(|e| {
                Error::backend("malformed field name in field domain response", e.to_string())
            })?;
            if domain.max < domain.min {
                return Err(Error::invalid_argument(format!(
                    "malformed domain for '{}': max {} is below min {}",
                    field, domain.max, domain.min
                )));
            }
            described.insert(field);
        }

        let grids: Vec<FieldBoundaries> = fields
            .iter()
            .filter(|f| described.contains(*f))
            .filter_map(|f| {
                windows.get(f).map(|(_, grid)| FieldBoundaries {
                    field: f.clone(),
                    boundaries: grid.clone(),
                })
            })
            .collect();
        if grids.is_empty() {
            debug!("No requested field holds numeric values");
            return Ok(Vec::new());
        }

        record_backend_call("ranges");
        let ranges = self
            .gateway
            .fetch_range_counts(query, &grids)
            .await
            .map_err(|e| e.in_context("fetching parametric ranges"))?;

        let mut by_field = HashMap::with_capacity(ranges.len());
        for field_ranges in ranges {
            let field = FieldPath::parse(&field_ranges.field).map_err(|e| {
                Error::backend("malformed field name in parametric ranges response", e.to_string())
            })?;
            by_field.entry(field).or_insert(field_ranges);
        }

        let mut results = Vec::with_capacity(by_field.len());
        for field in &fields {
            let (Some(reported), Some((window, grid))) = (by_field.get(field), windows.get(field))
            else {
                continue;
            };

            let summary = DomainSummary {
                total_count: reported.count,
                min: window.min(),
                max: window.max(),
            };
            let result = RangeReconciler::new(grid)
                .reconcile(
                    field.clone(),
                    self.normalizer.display_name(field),
                    summary,
                    &reported.ranges,
                )
                .map_err(|e| e.in_context("fetching parametric ranges"))?;
            results.push(result);
        }

        debug!(
            requested = fields.len(),
            returned = results.len(),
            "Bucketed numeric values"
        );
        Ok(results)
    }

    #[instrument(skip(self, request), fields(fields = request.field_names.len()))]
    async fn get_dependent_values(&self, request: &ParametricRequest) -> Result<Vec<DependentField>> {
        let fields = self.resolve_fields(request).await?;
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        record_backend_call("dependent");
        let raw = self
            .gateway
            .fetch_dependent_values(BackendQuery::from_request(request), &fields)
            .await
            .map_err(|e| e.in_context("fetching dependent parametric values"))?;

        raw.into_iter()
            .map(|node| self.dependent_node(node))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| e.in_context("fetching dependent parametric values"))
    }

    #[instrument(skip(self, request), fields(fields = request.field_names.len()))]
    async fn get_numeric_value_details(
        &self,
        request: &ParametricRequest,
    ) -> Result<BTreeMap<FieldPath, NumericValueDetails>> {
        let fields = dedupe(&request.field_names);
        if fields.is_empty() {
            return Ok(BTreeMap::new());
        }

        record_backend_call("describe");
        let domains = self
            .gateway
            .describe_field_domains(BackendQuery::from_request(request), &fields)
            .await
            .map_err(|e| e.in_context("describing numeric fields"))?;

        let mut details = BTreeMap::new();
        for domain in domains {
            let field = FieldPath::parse(&domain.field).map_err(|e| {
                Error::backend("malformed field name in field domain response", e.to_string())
            })?;
            details.entry(field).or_insert(NumericValueDetails {
                min: domain.min,
                max: domain.max,
                average: domain.average,
                sum: domain.sum,
                total_values: domain.count,
            });
        }
        Ok(details)
    }
}
