use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::{
    dto::fixture::GenerateFixtureResponse,
    error::{FixtureError, StorageError},
};
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Fixture(FixtureError),
    Validation(ValidationErrors),
    BadRequest(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Fixture(e) => write!(f, "Fixture error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

fn storage_response(error: &StorageError) -> (StatusCode, serde_json::Value) {
    match error {
        StorageError::NotFound => (
            StatusCode::NOT_FOUND,
            json!({
                "error": "Resource not found"
            }),
        ),
        StorageError::ConstraintViolation(msg) => (
            StatusCode::CONFLICT,
            json!({
                "error": msg
            }),
        ),
        e => {
            tracing::error!("Storage error: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "An internal error occurred"
                }),
            )
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, body) = match &self {
            Self::Storage(e) | Self::Fixture(FixtureError::Storage(e)) => storage_response(e),
            // Informational: nothing was written.
            Self::Fixture(e @ FixtureError::AlreadyExists) => {
                let notice = GenerateFixtureResponse::already_exists(e.to_string());
                return (StatusCode::OK, Json(notice)).into_response();
            }
            Self::Fixture(e) => {
                tracing::warn!("Fixture generation rejected: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "error": e.to_string()
                    }),
                )
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "Validation failed",
                        "details": field_errors
                    }),
                )
            }
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg
                }),
            ),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<FixtureError> for WebError {
    fn from(error: FixtureError) -> Self {
        Self::Fixture(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}
