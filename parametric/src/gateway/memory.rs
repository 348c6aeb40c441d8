//! Document-backed gateway.
//!
//! Evaluates requests against a set of JSON documents held in memory. Query
//! text, databases, date range and a small field text dialect
//! (`MATCH{a,b}:FIELD`, `EXISTS{}:FIELD`, joined with `AND`) restrict the
//! matching documents. Score and language restrictions are accepted and
//! ignored since documents carry no relevance or language data.

use super::{
    BackendQuery, BackendValueGateway, FieldBoundaries, FieldDomain, RawDependentValue,
    RawFieldRanges, RawFieldValues, RawRange, RawValue,
};
use crate::aggregations::{sort_values, DiscreteValue, ValuePatterns};
use crate::error::{Error, Result};
use crate::fields::{FieldPath, AUTN_DATE_FIELD};
use crate::request::{QueryRestrictions, SortOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// A stored document. Field values may be strings, numbers, booleans or
/// arrays of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl MemoryDocument {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            database: None,
            date: None,
            title: String::new(),
            content: String::new(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// String forms of every value stored under `field`, deduplicated.
    fn values(&self, field: &FieldPath) -> Vec<String> {
        if field.as_str() == AUTN_DATE_FIELD {
            return self.date.map(|d| vec![d.to_rfc3339()]).unwrap_or_default();
        }

        let mut out = Vec::new();
        for (name, value) in &self.fields {
            let matches = FieldPath::parse(name)
                .map(|p| p.as_str().eq_ignore_ascii_case(field.as_str()))
                .unwrap_or(false);
            if matches {
                flatten_value(value, &mut out);
            }
        }

        let mut seen = HashSet::with_capacity(out.len());
        out.retain(|v| seen.insert(v.clone()));
        out
    }

    /// Numeric values stored under `field`. The date field yields epoch
    /// seconds.
    fn numbers(&self, field: &FieldPath) -> Vec<f64> {
        if field.as_str() == AUTN_DATE_FIELD {
            return self.date.map(|d| vec![d.timestamp() as f64]).unwrap_or_default();
        }

        self.values(field)
            .iter()
            .filter_map(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect()
    }

    fn contains_text(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.reference.to_lowercase().contains(&term)
            || self.title.to_lowercase().contains(&term)
            || self.content.to_lowercase().contains(&term)
            || self.fields.values().any(|value| {
                let mut strings = Vec::new();
                flatten_value(value, &mut strings);
                strings.iter().any(|s| s.to_lowercase().contains(&term))
            })
    }
}

fn flatten_value(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Number(n) => out.push(n.to_string()),
        serde_json::Value::Bool(b) => out.push(b.to_string()),
        serde_json::Value::Array(items) => items.iter().for_each(|item| flatten_value(item, out)),
        serde_json::Value::Null | serde_json::Value::Object(_) => {}
    }
}

#[derive(Debug)]
enum FieldCondition {
    Match { field: FieldPath, values: Vec<String> },
    Exists { field: FieldPath },
}

impl FieldCondition {
    fn admits(&self, doc: &MemoryDocument) -> bool {
        match self {
            FieldCondition::Match { field, values } => doc
                .values(field)
                .iter()
                .any(|v| values.iter().any(|wanted| wanted.eq_ignore_ascii_case(v))),
            FieldCondition::Exists { field } => !doc.values(field).is_empty(),
        }
    }
}

fn parse_field_text(field_text: &str) -> Result<Vec<FieldCondition>> {
    let clause_re = Regex::new(r"(?i)^(MATCH|EXISTS)\{([^}]*)\}:(.+)$")
        .map_err(|e| Error::backend("invalid field text", e))?;

    field_text
        .split(" AND ")
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            let caps = clause_re.captures(clause).ok_or_else(|| {
                Error::backend("invalid field text", format!("cannot parse '{}'", clause))
            })?;
            let field = FieldPath::parse(&caps[3])
                .map_err(|e| Error::backend("invalid field text", e.to_string()))?;

            if caps[1].eq_ignore_ascii_case("EXISTS") {
                Ok(FieldCondition::Exists { field })
            } else {
                let values = caps[2]
                    .split(',')
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect();
                Ok(FieldCondition::Match { field, values })
            }
        })
        .collect()
}

/// Gateway over an in-memory document set.
pub struct InMemoryGateway {
    documents: RwLock<Vec<MemoryDocument>>,
}

impl InMemoryGateway {
    pub fn new(documents: Vec<MemoryDocument>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Parse a JSON array of documents.
    pub fn from_json(json: &str) -> Result<Self> {
        let documents: Vec<MemoryDocument> = serde_json::from_str(json)?;
        Ok(Self::new(documents))
    }

    pub fn add_document(&self, document: MemoryDocument) {
        self.documents.write().push(document);
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Field names present in any document, normalised, in first-seen order.
    pub fn field_names(&self) -> Vec<FieldPath> {
        let docs = self.documents.read();
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for name in docs.iter().flat_map(|d| d.fields.keys()) {
            if let Ok(path) = FieldPath::parse(name) {
                if seen.insert(path.clone()) {
                    names.push(path);
                }
            }
        }
        names
    }

    fn matching(&self, restrictions: &QueryRestrictions) -> Result<Vec<MemoryDocument>> {
        let conditions = match &restrictions.field_text {
            Some(text) => parse_field_text(text)?,
            None => Vec::new(),
        };
        let terms: Vec<&str> = restrictions
            .query_text
            .split_whitespace()
            .filter(|t| *t != "*")
            .collect();

        let docs = self.documents.read();
        let matched: Vec<MemoryDocument> = docs
            .iter()
            .filter(|doc| {
                restrictions.databases.is_empty()
                    || doc
                        .database
                        .as_ref()
                        .is_some_and(|db| restrictions.databases.iter().any(|d| d == db))
            })
            .filter(|doc| match (restrictions.min_date, doc.date) {
                (Some(min), Some(date)) => date >= min,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|doc| match (restrictions.max_date, doc.date) {
                (Some(max), Some(date)) => date <= max,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|doc| terms.iter().all(|term| doc.contains_text(term)))
            .filter(|doc| conditions.iter().all(|c| c.admits(doc)))
            .cloned()
            .collect();

        debug!(
            query = %restrictions.query_text,
            matched = matched.len(),
            total = docs.len(),
            "Evaluated in-memory query"
        );
        Ok(matched)
    }
}

/// Values of `field` with document counts, in first-seen order.
fn count_values(docs: &[MemoryDocument], field: &FieldPath) -> Vec<RawValue> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for doc in docs {
        for value in doc.values(field) {
            let count = counts.entry(value.clone()).or_insert_with(|| {
                order.push(value.clone());
                0
            });
            *count += 1;
        }
    }
    order
        .into_iter()
        .map(|value| {
            let count = counts.get(&value).copied().unwrap_or(0);
            RawValue::new(value, count)
        })
        .collect()
}

fn order_values(values: Vec<RawValue>, sort: SortOrder) -> Vec<RawValue> {
    let mut ordered: Vec<DiscreteValue> = values
        .into_iter()
        .map(|v| DiscreteValue::new(v.value, String::new(), v.count))
        .collect();
    sort_values(&mut ordered, sort);
    ordered
        .into_iter()
        .map(|v| RawValue::new(v.value, v.count))
        .collect()
}

fn dependent_tree(docs: &[MemoryDocument], fields: &[FieldPath]) -> Vec<RawDependentValue> {
    let Some((field, rest)) = fields.split_first() else {
        return Vec::new();
    };

    order_values(count_values(docs, field), SortOrder::DocumentCount)
        .into_iter()
        .map(|raw| {
            let subset: Vec<MemoryDocument> = docs
                .iter()
                .filter(|doc| doc.values(field).contains(&raw.value))
                .cloned()
                .collect();
            RawDependentValue {
                field: field.to_string(),
                children: dependent_tree(&subset, rest),
                value: raw.value,
                count: raw.count,
            }
        })
        .collect()
}

#[async_trait]
impl BackendValueGateway for InMemoryGateway {
    async fn fetch_discrete_values(
        &self,
        query: BackendQuery<'_>,
        fields: &[FieldPath],
        max_values: Option<usize>,
        sort: Option<SortOrder>,
        value_patterns: &[String],
    ) -> Result<Vec<RawFieldValues>> {
        let docs = self.matching(query.restrictions)?;
        let patterns = ValuePatterns::compile(value_patterns)?;
        let sort = sort.unwrap_or_default();

        Ok(fields
            .iter()
            .map(|field| {
                let admitted: Vec<RawValue> = count_values(&docs, field)
                    .into_iter()
                    .filter(|v| patterns.admits(&v.value))
                    .collect();
                let mut values = order_values(admitted, sort);
                if let Some(max) = max_values {
                    values.truncate(max);
                }
                RawFieldValues {
                    field: field.to_string(),
                    values,
                }
            })
            .collect())
    }

    async fn describe_field_domains(
        &self,
        query: BackendQuery<'_>,
        fields: &[FieldPath],
    ) -> Result<Vec<FieldDomain>> {
        let docs = self.matching(query.restrictions)?;

        Ok(fields
            .iter()
            .filter_map(|field| {
                let numbers: Vec<f64> = docs.iter().flat_map(|d| d.numbers(field)).collect();
                if numbers.is_empty() {
                    return None;
                }
                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let sum: f64 = numbers.iter().sum();
                Some(FieldDomain {
                    field: field.to_string(),
                    count: numbers.len() as u64,
                    min,
                    max,
                    average: sum / numbers.len() as f64,
                    sum,
                })
            })
            .collect())
    }

    async fn fetch_range_counts(
        &self,
        query: BackendQuery<'_>,
        grids: &[FieldBoundaries],
    ) -> Result<Vec<RawFieldRanges>> {
        let docs = self.matching(query.restrictions)?;

        Ok(grids
            .iter()
            .filter_map(|grid| {
                let numbers: Vec<f64> = docs.iter().flat_map(|d| d.numbers(&grid.field)).collect();
                if numbers.is_empty() {
                    return None;
                }

                let total = numbers.len() as u64;
                let mut counts = vec![0u64; grid.boundaries.bucket_count()];
                for value in numbers {
                    if let Some(index) = grid.boundaries.bucket_index(value) {
                        counts[index] += 1;
                    }
                }

                // Only ranges holding documents are reported.
                let ranges: Vec<RawRange> = grid
                    .boundaries
                    .pairs()
                    .zip(counts.iter())
                    .filter(|(_, count)| **count > 0)
                    .map(|((lower, upper), count)| RawRange::new(lower, upper, *count))
                    .collect();

                Some(RawFieldRanges {
                    field: grid.field.to_string(),
                    count: total,
                    ranges,
                })
            })
            .collect())
    }

    async fn fetch_dependent_values(
        &self,
        query: BackendQuery<'_>,
        fields: &[FieldPath],
    ) -> Result<Vec<RawDependentValue>> {
        let docs = self.matching(query.restrictions)?;
        Ok(dependent_tree(&docs, fields))
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregations::BucketBoundaries;
    use chrono::TimeZone;
    use serde_json::json;

    fn path(name: &str) -> FieldPath {
        FieldPath::parse(name).unwrap()
    }

    fn gateway() -> InMemoryGateway {
        InMemoryGateway::new(vec![
            MemoryDocument::new("doc-1")
                .with_database("news")
                .with_content("the cat sat")
                .with_field("CATEGORY", "sport")
                .with_field("PRICE", 3.5)
                .with_field("REGION", json!(["north", "east"])),
            MemoryDocument::new("doc-2")
                .with_database("news")
                .with_content("the dog ran")
                .with_field("/DOCUMENT/CATEGORY", "sport")
                .with_field("PRICE", "11"),
            MemoryDocument::new("doc-3")
                .with_database("archive")
                .with_content("a cat slept")
                .with_field("CATEGORY", "politics")
                .with_field("REGION", "north"),
        ])
    }

    #[tokio::test]
    async fn test_discrete_values_counted_across_paths() {
        let gw = gateway();
        let restrictions = QueryRestrictions::match_all();
        let values = gw
            .fetch_discrete_values(BackendQuery::new(&restrictions), &[path("CATEGORY")], None, None, &[])
            .await
            .unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(
            values[0].values,
            vec![RawValue::new("sport", 2), RawValue::new("politics", 1)]
        );
    }

    #[tokio::test]
    async fn test_query_text_and_database_restrict() {
        let gw = gateway();
        let restrictions = QueryRestrictions::with_text("cat").database("news");
        let values = gw
            .fetch_discrete_values(BackendQuery::new(&restrictions), &[path("CATEGORY")], None, None, &[])
            .await
            .unwrap();

        assert_eq!(values[0].values, vec![RawValue::new("sport", 1)]);
    }

    #[tokio::test]
    async fn test_field_text_match_and_exists() {
        let gw = gateway();
        let mut restrictions = QueryRestrictions::match_all();
        restrictions.field_text = Some("MATCH{north}:REGION AND EXISTS{}:PRICE".to_string());

        let values = gw
            .fetch_discrete_values(BackendQuery::new(&restrictions), &[path("CATEGORY")], None, None, &[])
            .await
            .unwrap();
        assert_eq!(values[0].values, vec![RawValue::new("sport", 1)]);

        restrictions.field_text = Some("NEAR{x}".to_string());
        let err = gw
            .fetch_discrete_values(BackendQuery::new(&restrictions), &[path("CATEGORY")], None, None, &[])
            .await
            .unwrap_err();
        assert!(err.is_backend());
    }

    #[tokio::test]
    async fn test_patterns_applied_before_truncation() {
        let gw = gateway();
        let restrictions = QueryRestrictions::match_all();
        let values = gw
            .fetch_discrete_values(
                BackendQuery::new(&restrictions),
                &[path("REGION")],
                Some(1),
                Some(SortOrder::Alphabetical),
                &["e*".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(values[0].values, vec![RawValue::new("east", 1)]);
    }

    #[tokio::test]
    async fn test_describe_domains_skips_non_numeric() {
        let gw = gateway();
        let restrictions = QueryRestrictions::match_all();
        let domains = gw
            .describe_field_domains(BackendQuery::new(&restrictions), &[path("PRICE"), path("CATEGORY")])
            .await
            .unwrap();

        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].field, "PRICE");
        assert_eq!(domains[0].count, 2);
        assert_eq!(domains[0].min, 3.5);
        assert_eq!(domains[0].max, 11.0);
        assert_eq!(domains[0].sum, 14.5);
        assert_eq!(domains[0].average, 7.25);
    }

    #[tokio::test]
    async fn test_range_counts_sparse_and_last_bucket_closed() {
        let gw = gateway();
        let restrictions = QueryRestrictions::match_all();
        let grid = FieldBoundaries {
            field: path("PRICE"),
            boundaries: BucketBoundaries::from_edges(vec![0.0, 5.0, 11.0]).unwrap(),
        };
        let ranges = gw
            .fetch_range_counts(BackendQuery::new(&restrictions), &[grid])
            .await
            .unwrap();

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].count, 2);
        assert_eq!(
            ranges[0].ranges,
            vec![RawRange::new(0.0, 5.0, 1), RawRange::new(5.0, 11.0, 1)]
        );
    }

    #[tokio::test]
    async fn test_range_total_counts_values_outside_grid() {
        let gw = InMemoryGateway::new(vec![
            MemoryDocument::new("a").with_field("PRICE", 3),
            MemoryDocument::new("b").with_field("PRICE", 40),
            MemoryDocument::new("c").with_field("PRICE", 55),
        ]);
        let restrictions = QueryRestrictions::match_all();
        let grid = FieldBoundaries {
            field: path("PRICE"),
            boundaries: BucketBoundaries::from_edges(vec![0.0, 5.0, 10.0]).unwrap(),
        };
        let ranges = gw
            .fetch_range_counts(BackendQuery::new(&restrictions), &[grid])
            .await
            .unwrap();

        assert_eq!(ranges[0].count, 3);
        assert_eq!(ranges[0].ranges, vec![RawRange::new(0.0, 5.0, 1)]);
    }

    #[tokio::test]
    async fn test_date_field_and_date_restrictions() {
        let early = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let gw = InMemoryGateway::new(vec![
            MemoryDocument::new("a").with_date(early),
            MemoryDocument::new("b").with_date(late),
            MemoryDocument::new("c"),
        ]);

        let restrictions = QueryRestrictions::match_all().date_range(Some(late), None);
        let domains = gw
            .describe_field_domains(BackendQuery::new(&restrictions), &[path("AUTN_DATE")])
            .await
            .unwrap();

        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].count, 1);
        assert_eq!(domains[0].min, late.timestamp() as f64);
    }

    #[tokio::test]
    async fn test_dependent_values_tree() {
        let gw = gateway();
        let restrictions = QueryRestrictions::match_all();
        let tree = gw
            .fetch_dependent_values(BackendQuery::new(&restrictions), &[path("CATEGORY"), path("REGION")])
            .await
            .unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].value, "sport");
        assert_eq!(tree[0].count, 2);
        let regions: Vec<&str> = tree[0].children.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(regions, vec!["north", "east"]);
        assert_eq!(tree[1].value, "politics");
        assert_eq!(tree[1].children.len(), 1);
    }

    #[test]
    fn test_from_json_and_field_names() {
        let gw = InMemoryGateway::from_json(
            r#"[{"reference": "x", "fields": {"/DOC/GENRE": "jazz", "YEAR": 1999}}]"#,
        )
        .unwrap();
        assert_eq!(gw.len(), 1);
        assert_eq!(gw.field_names(), vec![path("GENRE"), path("YEAR")]);

        gw.add_document(MemoryDocument::new("y"));
        assert_eq!(gw.len(), 2);
    }
}
