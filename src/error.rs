use thiserror::Error;

/// Classified failure of a service call.
///
/// Cloneable so it can travel back over a reply channel.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Only transport and deadline failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Unavailable(_))
    }

    /// Short class name, used in gateway error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION",
            ServiceError::Unavailable(_) => "UNAVAILABLE",
            ServiceError::Internal(_) => "INTERNAL",
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
