//! Canonical field identifiers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date field maintained by the backend itself. Its name is matched
/// case-insensitively and always stored in lower case.
pub const AUTN_DATE_FIELD: &str = "autn_date";

/// Canonical name of a parametric field.
///
/// Backends report fields as document paths (`/DOCUMENT/CATEGORY`); the
/// identifier keeps only the last path segment so that names requested by a
/// caller and names reported by the backend compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(String);

impl FieldPath {
    /// Normalise a raw field path.
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim();

        if name.is_empty() {
            return Err(Error::invalid_argument(format!(
                "Field names may not be blank or contain only forward slashes: '{}'",
                raw
            )));
        }

        if name.eq_ignore_ascii_case(AUTN_DATE_FIELD) {
            return Ok(Self(AUTN_DATE_FIELD.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FieldPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0
    }
}
