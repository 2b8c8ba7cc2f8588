use coshare_storage::StorageError;
use thiserror::Error;

use crate::identity::Unauthenticated;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error kinds surfaced to transports.
///
/// `Internal` never carries backend detail; the detail is logged where the
/// conversion happens.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited")]
    RateLimited,

    #[error("internal error")]
    Internal,
}

impl ServiceError {
    /// Whether a client may reasonably retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::RateLimited | ServiceError::Internal)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CollectionNotFound => ServiceError::NotFound("collection".to_string()),
            StorageError::TokenNotFound => ServiceError::NotFound("sharing token".to_string()),
            StorageError::Unauthorized => ServiceError::Unauthorized,
            StorageError::Backend(detail) => {
                tracing::error!(error = %detail, "storage backend failure");
                ServiceError::Internal
            }
        }
    }
}

impl From<Unauthenticated> for ServiceError {
    fn from(_: Unauthenticated) -> Self {
        ServiceError::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detail_is_not_exposed() {
        let err = ServiceError::from(StorageError::Backend(
            "password authentication failed for user \"coshare\"".to_string(),
        ));
        assert!(matches!(err, ServiceError::Internal));
        assert_eq!(err.to_string(), "internal error");
    }

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(
            ServiceError::from(StorageError::CollectionNotFound).to_string(),
            "collection not found"
        );
        assert_eq!(
            ServiceError::from(StorageError::TokenNotFound).to_string(),
            "sharing token not found"
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ServiceError::RateLimited.is_retryable());
        assert!(ServiceError::Internal.is_retryable());
        assert!(!ServiceError::Unauthorized.is_retryable());
        assert!(!ServiceError::NotFound("collection".to_string()).is_retryable());
    }
}
