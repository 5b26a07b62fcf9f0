use assessment_utils::submission::ValidationIssue;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Validation error")]
    Validation(Vec<ValidationIssue>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Server(String),
    // Froms
    #[error("{0}")]
    MongoDB(#[from] mongodb::error::Error),
    #[error("{0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Validation error", "errors": issues })),
            )
                .into_response(),
            Error::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            Error::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
            }
            Error::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            // Persistence and hashing failures are logged server-side; the
            // client only sees a generic message.
            Error::Server(_) | Error::MongoDB(_) | Error::Bcrypt(_) => {
                error!(error = %self, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Server error" })),
                )
                    .into_response()
            }
        }
    }
}
