//! HTTP error responses
//!
//! Every failure leaves the API as a `{title, description}` body with the
//! status of its error class.

use crate::error::{ErrorBody, ErrorClass, PodiumError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    /// Status code and payload for this error
    pub fn parts(&self) -> (StatusCode, ErrorBody) {
        let (class, body) = ErrorBody::from_error(&self.0);
        (status_for(class), body)
    }
}

/// Transport status of an error class
pub fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Client => StatusCode::BAD_REQUEST,
        ErrorClass::Server => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

/// Malformed request bodies are client errors
pub fn invalid_body(rejection: JsonRejection) -> ApiError {
    PodiumError::invalid_input(format!("Malformed request body: {}", rejection.body_text())).into()
}

/// Malformed query strings are client errors
pub fn invalid_query(rejection: QueryRejection) -> ApiError {
    PodiumError::invalid_input(format!("Malformed query: {}", rejection.body_text())).into()
}
