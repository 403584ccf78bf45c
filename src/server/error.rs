use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use thiserror::Error;
use crate::models::api::ErrorBody;

pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to get response from the assistant.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    QuotaExceeded(String),
    #[error("Too many requests, please slow down.")]
    RateLimited,
    #[error("{}", UPSTREAM_FAILURE_MESSAGE)]
    Upstream,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::QuotaExceeded(_) | ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: Some(self.to_string()) };
        (self.status(), Json(body)).into_response()
    }
}
