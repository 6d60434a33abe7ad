use axum::{http::StatusCode, Json};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the tracker core.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    ImportFormat(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("expense {0} not found")]
    NotFound(u64),
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn import_format(message: impl Into<String>) -> Self {
        Self::ImportFormat(message.into())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Validation(_) | TrackerError::ImportFormat(_) => {
                Self::bad_request(err.to_string())
            }
            TrackerError::NotFound(_) => Self::not_found(err.to_string()),
            TrackerError::Storage(err) => Self::internal(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_errors_map_to_status_codes() {
        let validation: AppError = TrackerError::validation("bad").into();
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.message, "bad");

        let missing: AppError = TrackerError::NotFound(7).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let storage: AppError = TrackerError::from(io).into();
        assert_eq!(storage.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
