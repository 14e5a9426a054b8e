use http::StatusCode;
use thiserror::Error;

/// Application-level error type.
/// Carries an HTTP-like status so the adapter envelope matches what a real
/// network client would throw.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Raw stored value failed to parse. Always recovered inside the
    /// document store; never crosses the adapter boundary.
    #[error("Malformed storage: {0}")]
    MalformedStorage(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Status code for the error envelope (404 / 401 / 400, 500 otherwise).
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedStorage(_) | AppError::Storage(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn resume_not_found() -> Self {
        AppError::NotFound("Resume not found".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::resume_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Validation("bad body".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MalformedStorage("unexpected eof".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::resume_not_found().to_string(), "Resume not found");
    }
}
