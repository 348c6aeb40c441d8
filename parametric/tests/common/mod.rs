//! Scripted gateway shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parametric::error::{Error, Result};
use parametric::fields::{FieldPath, StaticFieldResolver, TitleCaseNormalizer};
use parametric::gateway::{
    BackendQuery, BackendValueGateway, FieldBoundaries, FieldDomain, RawFieldRanges,
    RawFieldValues, RawRange, RawValue,
};
use parametric::request::SortOrder;
use parametric::ParametricValuesService;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Replays canned responses and counts calls.
#[derive(Default)]
pub struct ScriptedGateway {
    pub values: Vec<RawFieldValues>,
    pub domains: Vec<FieldDomain>,
    pub ranges: Vec<RawFieldRanges>,
    pub failure: Option<String>,
    pub delay: Option<Duration>,
    pub value_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
    pub range_calls: AtomicUsize,
    pub requested_grids: Mutex<Vec<FieldBoundaries>>,
}

impl ScriptedGateway {
    pub fn calls(&self) -> usize {
        self.value_calls.load(Ordering::SeqCst)
            + self.describe_calls.load(Ordering::SeqCst)
            + self.range_calls.load(Ordering::SeqCst)
    }

    async fn respond<T: Clone>(&self, canned: &[T]) -> Result<Vec<T>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(Error::backend("scripted failure", message.clone())),
            None => Ok(canned.to_vec()),
        }
    }
}

#[async_trait]
impl BackendValueGateway for ScriptedGateway {
    async fn fetch_discrete_values(
        &self,
        _query: BackendQuery<'_>,
        _fields: &[FieldPath],
        _max_values: Option<usize>,
        _sort: Option<SortOrder>,
        _value_patterns: &[String],
    ) -> Result<Vec<RawFieldValues>> {
        self.value_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(&self.values).await
    }

    async fn describe_field_domains(
        &self,
        _query: BackendQuery<'_>,
        _fields: &[FieldPath],
    ) -> Result<Vec<FieldDomain>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.respond(&self.domains).await
    }

    async fn fetch_range_counts(
        &self,
        _query: BackendQuery<'_>,
        grids: &[FieldBoundaries],
    ) -> Result<Vec<RawFieldRanges>> {
        self.range_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_grids.lock().extend(grids.iter().cloned());
        self.respond(&self.ranges).await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn path(name: &str) -> FieldPath {
    FieldPath::parse(name).unwrap()
}

pub fn field_values(field: &str, values: &[(&str, u64)]) -> RawFieldValues {
    RawFieldValues {
        field: field.to_string(),
        values: values.iter().map(|(v, c)| RawValue::new(*v, *c)).collect(),
    }
}

pub fn domain(field: &str, min: f64, max: f64, count: u64) -> FieldDomain {
    FieldDomain {
        field: field.to_string(),
        count,
        min,
        max,
        average: 0.0,
        sum: 0.0,
    }
}

pub fn unit_ranges(field: &str, start: f64, counts: &[u64]) -> RawFieldRanges {
    RawFieldRanges {
        field: field.to_string(),
        count: counts.iter().sum(),
        ranges: counts
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let lower = start + i as f64;
                RawRange::new(lower, lower + 1.0, *c)
            })
            .collect(),
    }
}

/// Three fields used throughout the discrete value tests.
pub fn three_fields() -> Vec<RawFieldValues> {
    vec![
        field_values("grassy field", &[("birds", 65), ("snakes", 33)]),
        field_values("wasteland", &[("humans", 153), ("mutants", 45)]),
        field_values("football field", &[("worms", 100), ("slugs", 50)]),
    ]
}

pub fn service(gateway: Arc<ScriptedGateway>, resolver: StaticFieldResolver) -> ParametricValuesService {
    ParametricValuesService::new(
        Arc::new(resolver),
        gateway,
        Arc::new(TitleCaseNormalizer::new()),
    )
}
