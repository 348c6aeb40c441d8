use thiserror::Error;

/// Boxed cause carried by [`Error::Backend`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied inconsistent parameters. Never retried.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend collaborator failed or returned malformed data.
    #[error("Backend error ({context}): {source}")]
    Backend { context: String, source: BoxError },

    /// The backend integration does not implement the requested capability.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn backend(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Backend {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Error::UnsupportedOperation(operation.into())
    }

    /// Prefix the context of a backend error with the request being served.
    /// Other variants pass through unchanged.
    pub fn in_context(self, request: impl AsRef<str>) -> Self {
        match self {
            Error::Backend { context, source } => Error::Backend {
                context: format!("{}: {}", request.as_ref(), context),
                source,
            },
            other => other,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Backend { .. })
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedOperation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_argument("must request at least one bucket");
        assert_eq!(
            err.to_string(),
            "Invalid argument: must request at least one bucket"
        );
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = Error::backend("fetch range counts", io);

        assert!(err.is_backend());
        assert_eq!(err.to_string(), "Backend error (fetch range counts): timed out");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_in_context_only_touches_backend_errors() {
        let err = Error::backend("describe", "connection reset").in_context("numeric buckets");
        assert_eq!(
            err.to_string(),
            "Backend error (numeric buckets: describe): connection reset"
        );

        let err = Error::unsupported("dependent values").in_context("ignored");
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "Unsupported operation: dependent values");
    }
}
