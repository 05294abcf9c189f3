use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const UPSTREAM_FAILURE_BODY: &str = "Failed to fetch from device";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("device unreachable: {0}")]
    Upstream(String),

    #[error("log write failed: {0}")]
    Storage(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Upstream(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE_BODY).into_response()
            }
            ApiError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to log" })),
            )
                .into_response(),
        }
    }
}
