use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use parametric::config::Config;
use parametric::fields::{FieldPath, FieldResolver, StaticFieldResolver, TitleCaseNormalizer};
use parametric::gateway::InMemoryGateway;
use parametric::request::{ParametricRequest, QueryRestrictions, SortOrder};
use parametric::{
    BucketingParams, CachedParametricValuesService, ParametricValues, ParametricValuesService,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Resolves the default field set to every field seen in the documents.
struct DocumentFieldResolver {
    gateway: Arc<InMemoryGateway>,
}

#[async_trait]
impl FieldResolver for DocumentFieldResolver {
    async fn parametric_fields(&self) -> parametric::Result<Vec<FieldPath>> {
        Ok(self.gateway.field_names())
    }
}

/// Service stack built from the config and the document set.
pub struct Engine {
    service: Arc<dyn ParametricValues>,
    gateway: Arc<InMemoryGateway>,
    default_max_values: usize,
    default_sort: SortOrder,
}

impl Engine {
    pub fn open(config: &Config, documents: Option<&Path>) -> Result<Self> {
        let path = documents
            .or(config.engine.documents.as_deref())
            .ok_or_else(|| anyhow!("No document set given; pass --documents or set engine.documents"))?;

        let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let gateway = Arc::new(
            InMemoryGateway::from_json(&json)
                .with_context(|| format!("Failed to parse documents in {:?}", path))?,
        );
        tracing::info!("Loaded {} documents from {:?}", gateway.len(), path);

        let resolver: Arc<dyn FieldResolver> = if config.engine.parametric_fields.is_empty() {
            Arc::new(DocumentFieldResolver {
                gateway: Arc::clone(&gateway),
            })
        } else {
            Arc::new(StaticFieldResolver::from_names(&config.engine.parametric_fields)?)
        };

        let service = ParametricValuesService::new(
            resolver,
            Arc::clone(&gateway) as Arc<dyn parametric::BackendValueGateway>,
            Arc::new(TitleCaseNormalizer::new()),
        );

        let service: Arc<dyn ParametricValues> = if config.cache.enabled {
            Arc::new(CachedParametricValuesService::new(service, config.cache.max_entries))
        } else {
            Arc::new(service)
        };

        Ok(Self {
            service,
            gateway,
            default_max_values: config.engine.default_max_values,
            default_sort: config.engine.default_sort,
        })
    }
}

/// `FIELD:BUCKETS:MIN:MAX`
#[derive(Debug, Clone, PartialEq)]
pub struct BucketSpec {
    pub field: FieldPath,
    pub params: BucketingParams,
}

impl FromStr for BucketSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.rsplitn(4, ':');
        let (Some(max), Some(min), Some(count), Some(field)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected FIELD:BUCKETS:MIN:MAX, got '{}'", s));
        };

        let count: u32 = count
            .trim()
            .parse()
            .map_err(|e| format!("invalid bucket count '{}': {}", count, e))?;
        let min: f64 = min
            .trim()
            .parse()
            .map_err(|e| format!("invalid min '{}': {}", min, e))?;
        let max: f64 = max
            .trim()
            .parse()
            .map_err(|e| format!("invalid max '{}': {}", max, e))?;

        Ok(Self {
            field: FieldPath::parse(field).map_err(|e| e.to_string())?,
            params: BucketingParams::new(count, min, max).map_err(|e| e.to_string())?,
        })
    }
}

fn parse_fields(fields: &[String]) -> Result<Vec<FieldPath>> {
    fields
        .iter()
        .map(|f| FieldPath::parse(f).map_err(Into::into))
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_values(
    engine: &Engine,
    restrictions: QueryRestrictions,
    fields: &[String],
    max_values: Option<usize>,
    sort: Option<&str>,
    filters: Vec<String>,
) -> Result<()> {
    let sort = match sort {
        Some(s) => SortOrder::parse(s).ok_or_else(|| anyhow!("Unknown sort order '{}'", s))?,
        None => engine.default_sort,
    };

    let mut builder = ParametricRequest::builder()
        .field_names(parse_fields(fields)?)
        .max_values(max_values.unwrap_or(engine.default_max_values))
        .sort(sort)
        .query_restrictions(restrictions);
    for filter in filters {
        builder = builder.value_restriction(filter);
    }

    let results = engine.service.get_parametric_values(&builder.build()).await?;
    tracing::debug!("{} fields returned", results.len());
    print_json(&results)
}

pub async fn run_buckets(
    engine: &Engine,
    restrictions: QueryRestrictions,
    specs: &[BucketSpec],
) -> Result<()> {
    let mut params = HashMap::with_capacity(specs.len());
    for spec in specs {
        if params.insert(spec.field.clone(), spec.params).is_some() {
            bail!("Field '{}' given more than once", spec.field);
        }
    }

    let request = ParametricRequest::builder()
        .field_names(specs.iter().map(|s| s.field.clone()))
        .query_restrictions(restrictions)
        .build();

    let results = engine.service.get_numeric_values_in_buckets(&request, &params).await?;
    print_json(&results)
}

pub async fn run_details(
    engine: &Engine,
    restrictions: QueryRestrictions,
    fields: &[String],
) -> Result<()> {
    let request = ParametricRequest::builder()
        .field_names(parse_fields(fields)?)
        .query_restrictions(restrictions)
        .build();

    let details = engine.service.get_numeric_value_details(&request).await?;
    print_json(&details)
}

pub async fn run_dependent(
    engine: &Engine,
    restrictions: QueryRestrictions,
    fields: &[String],
) -> Result<()> {
    let request = ParametricRequest::builder()
        .field_names(parse_fields(fields)?)
        .query_restrictions(restrictions)
        .build();

    let tree = engine.service.get_dependent_values(&request).await?;
    print_json(&tree)
}

pub fn run_fields(engine: &Engine) -> Result<()> {
    for field in engine.gateway.field_names() {
        println!("{}", field);
    }
    Ok(())
}
