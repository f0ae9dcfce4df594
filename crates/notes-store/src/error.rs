//! Error types for the storage layer.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// Database driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No document with this id exists in the collection.
    #[error("document not found: {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },

    /// A stored document cannot be read as the expected entity.
    #[error("corrupt document {id}: {reason}")]
    CorruptDocument { id: String, reason: String },

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),
}

impl StoreError {
    /// Whether the failure is the store being unreachable rather than
    /// something wrong with the request or the data.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            _ => false,
        }
    }

    pub(crate) fn corrupt(id: &str, reason: impl Into<String>) -> Self {
        Self::CorruptDocument {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(StoreError::Unavailable("down".into()).is_unavailable());
        assert!(StoreError::Database(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(!StoreError::Database(sqlx::Error::RowNotFound).is_unavailable());
        assert!(
            !StoreError::DocumentNotFound {
                collection: "notes".into(),
                id: "x".into()
            }
            .is_unavailable()
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = StoreError::DocumentNotFound {
            collection: "notes".into(),
            id: "abc".into(),
        };
        assert_eq!(err.to_string(), "document not found: notes/abc");
    }
}
