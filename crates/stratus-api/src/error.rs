//! Error → HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stratus_core::error::StratusError;
use tracing::error;

/// Wrapper turning [`StratusError`] into an HTTP response.
pub struct ApiError(pub StratusError);

impl<E: Into<StratusError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            StratusError::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Record not found." })),
            )
                .into_response(),

            StratusError::Validation { errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                })),
            )
                .into_response(),

            StratusError::SlugInUse { slug } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": { "slug": [format!("The slug {slug} is already in use.")] },
                })),
            )
                .into_response(),

            StratusError::InvalidCredentials => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": { "email": ["Invalid credentials."] },
                })),
            )
                .into_response(),

            StratusError::InactiveAccount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "message": "The given data was invalid.",
                    "errors": { "email": ["Inactive account."] },
                })),
            )
                .into_response(),

            StratusError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthenticated." })),
            )
                .into_response(),

            err @ StratusError::Provisioning { .. } => {
                error!(error = %err, "provisioning failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Tenant provisioning failed." })),
                )
                    .into_response()
            }

            err => {
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}
