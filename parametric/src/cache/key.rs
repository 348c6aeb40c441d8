use crate::aggregations::BucketingParams;
use crate::error::Result;
use crate::fields::FieldPath;
use crate::request::{ParametricRequest, QueryRestrictions};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// Identity of a bucketed request: caller scope, query restrictions, the
/// requested fields in order and their bucketing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

#[derive(Serialize)]
struct KeyMaterial<'a> {
    scope: &'a str,
    restrictions: &'a QueryRestrictions,
    modified: bool,
    fields: Vec<(&'a FieldPath, Option<&'a BucketingParams>)>,
}

impl CacheKey {
    pub fn for_buckets(
        scope: &str,
        request: &ParametricRequest,
        params: &HashMap<FieldPath, BucketingParams>,
    ) -> Result<Self> {
        let material = KeyMaterial {
            scope,
            restrictions: &request.query_restrictions,
            modified: request.modified,
            fields: request
                .field_names
                .iter()
                .map(|field| (field, params.get(field)))
                .collect(),
        };

        let json = serde_json::to_vec(&material)?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
