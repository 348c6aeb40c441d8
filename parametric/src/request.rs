//! Request objects handed to the engine by callers.

use crate::fields::FieldPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordering applied to discrete values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Alphabetical,
    ReverseAlphabetical,
    /// Highest count first
    #[default]
    DocumentCount,
    NumberIncreasing,
    NumberDecreasing,
    /// Keep whatever order the backend produced
    Off,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "alphabetical" => Some(SortOrder::Alphabetical),
            "reverse_alphabetical" => Some(SortOrder::ReverseAlphabetical),
            "document_count" | "count" => Some(SortOrder::DocumentCount),
            "number_increasing" => Some(SortOrder::NumberIncreasing),
            "number_decreasing" => Some(SortOrder::NumberDecreasing),
            "off" | "none" => Some(SortOrder::Off),
            _ => None,
        }
    }
}

/// Filter context passed through to the backend unmodified.
///
/// The engine never interprets these restrictions; they take part in cache
/// keys and are otherwise the gateway's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRestrictions {
    #[serde(default = "default_query_text")]
    pub query_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_text: Option<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_type: Option<String>,
    #[serde(default)]
    pub any_language: bool,
}

fn default_query_text() -> String {
    "*".to_string()
}

impl Default for QueryRestrictions {
    fn default() -> Self {
        Self {
            query_text: default_query_text(),
            field_text: None,
            databases: Vec::new(),
            min_date: None,
            max_date: None,
            min_score: None,
            language_type: None,
            any_language: false,
        }
    }
}

impl QueryRestrictions {
    /// Match every document.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn with_text(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            ..Default::default()
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.databases.push(database.into());
        self
    }

    pub fn date_range(mut self, min: Option<DateTime<Utc>>, max: Option<DateTime<Utc>>) -> Self {
        self.min_date = min;
        self.max_date = max;
        self
    }
}

/// A parametric values request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricRequest {
    #[serde(default)]
    pub field_names: Vec<FieldPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_values: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
    /// Glob patterns; a value is kept when any pattern matches it
    #[serde(default)]
    pub value_restrictions: Vec<String>,
    #[serde(default)]
    pub query_restrictions: QueryRestrictions,
    /// Whether the backend should apply query manipulation
    #[serde(default)]
    pub modified: bool,
}

impl ParametricRequest {
    pub fn builder() -> ParametricRequestBuilder {
        ParametricRequestBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParametricRequestBuilder {
    field_names: Vec<FieldPath>,
    max_values: Option<usize>,
    sort: Option<SortOrder>,
    value_restrictions: Vec<String>,
    query_restrictions: Option<QueryRestrictions>,
    modified: bool,
}

impl ParametricRequestBuilder {
    pub fn field_name(mut self, field: FieldPath) -> Self {
        self.field_names.push(field);
        self
    }

    pub fn field_names(mut self, fields: impl IntoIterator<Item = FieldPath>) -> Self {
        self.field_names.extend(fields);
        self
    }

    pub fn max_values(mut self, max_values: usize) -> Self {
        self.max_values = Some(max_values);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn value_restriction(mut self, pattern: impl Into<String>) -> Self {
        self.value_restrictions.push(pattern.into());
        self
    }

    pub fn query_restrictions(mut self, restrictions: QueryRestrictions) -> Self {
        self.query_restrictions = Some(restrictions);
        self
    }

    pub fn modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    pub fn build(self) -> ParametricRequest {
        ParametricRequest {
            field_names: self.field_names,
            max_values: self.max_values,
            sort: self.sort,
            value_restrictions: self.value_restrictions,
            query_restrictions: self.query_restrictions.unwrap_or_else(QueryRestrictions::match_all),
            modified: self.modified,
        }
    }
}
