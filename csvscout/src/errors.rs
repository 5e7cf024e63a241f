/// Error types shared by the loader, the engine and the gateway.
///
/// Every fallible operation returns [`SearchResult`]. Failures that happen inside a
/// single partition of a concurrent search are not propagated with `?`; they are
/// folded into a [`crate::results::PartitionOutcome`] using [`SearchError::kind`]
/// and the error's display text, so one bad chunk never voids the rest of a batch.
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while loading or searching a dataset
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File {0} not found")]
    NotFound(PathBuf),
    #[error("Invalid search header: {0}")]
    InvalidColumn(String),
    #[error("Schema mismatch in {path} at line {line}: expected {expected} fields, found {found}")]
    SchemaMismatch {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("{0}")]
    LoadError(String),
    #[error("Worker failed: {0}")]
    WorkerError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid algorithm. Choose 'serial' or 'parallel'.")]
    InvalidAlgorithm(String),
    #[error("Native runner error: {0}")]
    NativeError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse classification of a [`SearchError`], carried in partition outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    InvalidColumn,
    SchemaMismatch,
    LoadError,
    WorkerError,
    InvalidArgument,
    InvalidAlgorithm,
    NativeError,
    ConfigError,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidColumn => "InvalidColumn",
            ErrorKind::SchemaMismatch => "SchemaMismatch",
            ErrorKind::LoadError => "LoadError",
            ErrorKind::WorkerError => "WorkerError",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InvalidAlgorithm => "InvalidAlgorithm",
            ErrorKind::NativeError => "NativeError",
            ErrorKind::ConfigError => "ConfigError",
            ErrorKind::Io => "Io",
        };
        f.write_str(name)
    }
}

impl SearchError {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn invalid_column(column: impl Into<String>) -> Self {
        Self::InvalidColumn(column.into())
    }

    pub fn schema_mismatch(
        path: impl Into<PathBuf>,
        line: u64,
        expected: usize,
        found: usize,
    ) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            line,
            expected,
            found,
        }
    }

    pub fn load_error(msg: impl Into<String>) -> Self {
        Self::LoadError(msg.into())
    }

    pub fn worker_error(msg: impl Into<String>) -> Self {
        Self::WorkerError(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_algorithm(value: impl Into<String>) -> Self {
        Self::InvalidAlgorithm(value.into())
    }

    pub fn native_error(msg: impl Into<String>) -> Self {
        Self::NativeError(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Returns the classification used when this error is reported in-band
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::NotFound(_) => ErrorKind::NotFound,
            SearchError::InvalidColumn(_) => ErrorKind::InvalidColumn,
            SearchError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            SearchError::LoadError(_) => ErrorKind::LoadError,
            SearchError::WorkerError(_) => ErrorKind::WorkerError,
            SearchError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            SearchError::InvalidAlgorithm(_) => ErrorKind::InvalidAlgorithm,
            SearchError::NativeError(_) => ErrorKind::NativeError,
            SearchError::ConfigError(_) => ErrorKind::ConfigError,
            SearchError::IoError(_) | SearchError::JsonError(_) => ErrorKind::Io,
        }
    }
}

impl From<csv::Error> for SearchError {
    fn from(err: csv::Error) -> Self {
        SearchError::LoadError(err.to_string())
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        SearchError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let path = Path::new("data.csv");
        let err = SearchError::not_found(path);
        assert!(matches!(err, SearchError::NotFound(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = SearchError::invalid_column("Country Name");
        assert!(matches!(err, SearchError::InvalidColumn(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidColumn);

        let err = SearchError::schema_mismatch(path, 3, 13, 12);
        assert!(matches!(err, SearchError::SchemaMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);

        let err = SearchError::worker_error("panicked");
        assert_eq!(err.kind(), ErrorKind::WorkerError);

        let err = SearchError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_error_messages() {
        let err = SearchError::not_found("missing.csv");
        assert_eq!(err.to_string(), "File missing.csv not found");

        let err = SearchError::schema_mismatch("air.csv", 7, 13, 11);
        assert_eq!(
            err.to_string(),
            "Schema mismatch in air.csv at line 7: expected 13 fields, found 11"
        );

        let err = SearchError::invalid_algorithm("fast");
        assert_eq!(
            err.to_string(),
            "Invalid algorithm. Choose 'serial' or 'parallel'."
        );

        let err = SearchError::load_error("No columns to parse from file");
        assert_eq!(err.to_string(), "No columns to parse from file");

        let err = SearchError::config_error("Missing required field");
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required field"
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::SchemaMismatch.to_string(), "SchemaMismatch");
        assert_eq!(
            serde_json::to_value(ErrorKind::LoadError).unwrap(),
            serde_json::json!("LoadError")
        );
    }
}
