//! HTTP translation layer: request bodies in, status codes and JSON out.

pub mod users;

use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::error::UserError;

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = ApiErrorResponse {
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
        },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            UserError::DuplicateUser(email) => error_response(
                StatusCode::CONFLICT,
                "DUPLICATE_USER",
                format!("A user with email '{email}' already exists."),
            ),
            UserError::ServiceUnavailable(_) => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "The user store is temporarily unavailable.",
            ),
            UserError::Unexpected(msg) => {
                error!(error = %msg, "unexpected error while handling request");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.",
                )
            }
        }
    }
}

/// Fallback for every path without a route.
pub async fn not_found(uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("No route for {}", uri.path()),
    )
}
