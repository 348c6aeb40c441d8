//! Field identifiers and the field collaborators used by the engine.
//!
//! The engine never talks to a schema service directly. It asks a
//! [`FieldResolver`] for the default set of parametric fields and a
//! [`FieldDisplayNormalizer`] for human-readable names.

mod display;
mod path;

pub use display::{title_case, TitleCaseNormalizer};
pub use path::{FieldPath, AUTN_DATE_FIELD};

use crate::error::Result;
use async_trait::async_trait;

/// Resolves the default field set when a caller names no fields.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// All fields typed as parametric in the backend.
    async fn parametric_fields(&self) -> Result<Vec<FieldPath>>;
}

/// Produces display forms without touching the underlying identity.
pub trait FieldDisplayNormalizer: Send + Sync {
    fn display_name(&self, field: &FieldPath) -> String;

    fn display_value(&self, _field: &FieldPath, value: &str) -> String {
        value.to_string()
    }
}

/// Resolver over a fixed list, for configurations where the parametric
/// fields are known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticFieldResolver {
    fields: Vec<FieldPath>,
}

impl StaticFieldResolver {
    pub fn new(fields: Vec<FieldPath>) -> Self {
        Self { fields }
    }

    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|name| FieldPath::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

#[async_trait]
impl FieldResolver for StaticFieldResolver {
    async fn parametric_fields(&self) -> Result<Vec<FieldPath>> {
        Ok(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticFieldResolver::from_names(["/DOCUMENT/CATEGORY", "AUTHOR"]).unwrap();
        let fields = resolver.parametric_fields().await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].as_str(), "CATEGORY");
        assert_eq!(fields[1].as_str(), "AUTHOR");
    }

    #[test]
    fn test_static_resolver_rejects_blank() {
        assert!(StaticFieldResolver::from_names(["ok", "/"]).is_err());
    }
}
