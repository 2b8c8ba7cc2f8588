use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
///
/// Existence and authorization failures are decided inside the store;
/// `Backend` carries driver detail that must not reach callers.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("collection not found")]
    CollectionNotFound,

    #[error("sharing token not found")]
    TokenNotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::CollectionNotFound | StorageError::TokenNotFound
        )
    }
}
