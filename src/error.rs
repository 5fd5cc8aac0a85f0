use thiserror::Error;

/// Main error type for kgquery
#[derive(Error, Debug)]
pub enum KgError {
    /// Query parameters rejected before any store access
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The graph store failed or could not be reached; the query is abandoned
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// The per-query deadline expired during traversal
    #[error("Query deadline exceeded after {0} ms")]
    DeadlineExceeded(u64),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed graph data handed to a store
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl KgError {
    /// Collapse any adapter-side failure into `StoreUnavailable`.
    pub fn into_store_error(self) -> Self {
        match self {
            KgError::StoreUnavailable(_) | KgError::DeadlineExceeded(_) => self,
            other => KgError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Convenient Result type using KgError
pub type Result<T> = std::result::Result<T, KgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KgError::InvalidArgument("max_depth must be >= 0".to_string());
        assert!(err.to_string().contains("Invalid argument"));
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let kg_err: KgError = rusqlite_err.into();
        assert!(matches!(kg_err, KgError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let kg_err: KgError = io_err.into();
        assert!(matches!(kg_err, KgError::Io(_)));
    }

    #[test]
    fn test_into_store_error_wraps_database() {
        let err = KgError::Database(rusqlite::Error::InvalidQuery).into_store_error();
        assert!(matches!(err, KgError::StoreUnavailable(_)));
    }

    #[test]
    fn test_into_store_error_keeps_deadline() {
        let err = KgError::DeadlineExceeded(50).into_store_error();
        assert!(matches!(err, KgError::DeadlineExceeded(50)));
    }
}
