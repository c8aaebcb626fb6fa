//! Error handling for the stock ledger server
//!
//! Issues (out of stock, negative margin) are data, not errors; nothing here
//! represents them.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{ItemError, ValidationFailure};
use thiserror::Error;

use crate::store::StoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationBatch(#[from] ValidationFailure),

    // Store errors
    #[error("Event store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation {
            field: "body".to_string(),
            message: rejection.body_text(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    /// Per-item failures of a rejected batch
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ItemError>,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationBatch(failure) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: failure.to_string(),
                    field: None,
                },
            ),
            AppError::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message: "The transaction store is unavailable".to_string(),
                    field: None,
                },
            ),
            AppError::NotImplemented(what) => (
                StatusCode::NOT_IMPLEMENTED,
                ErrorDetail {
                    code: "NOT_IMPLEMENTED".to_string(),
                    message: format!("{} is not implemented", what),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let errors = match self {
            AppError::ValidationBatch(failure) => failure.errors,
            _ => Vec::new(),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_detail,
                errors,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let err = AppError::Validation {
            field: "sku".to_string(),
            message: "SKU must be a non-empty string".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_batch_failure_maps_to_422() {
        let err = AppError::from(ValidationFailure {
            errors: vec![ItemError {
                index: 0,
                field: "qty".to_string(),
                message: "Quantity must be a positive integer".to_string(),
            }],
        });
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_store_failure_maps_to_503() {
        let err = AppError::from(StoreError::Poisoned);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_not_implemented_maps_to_501() {
        let err = AppError::NotImplemented("Profit reporting".to_string());
        assert_eq!(err.into_response().status(), StatusCode::NOT_IMPLEMENTED);
    }
}
