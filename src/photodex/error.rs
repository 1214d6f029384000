use crate::source::SourceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotodexError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Photo service failure: {0}")]
    Upstream(String),
}

impl From<SourceError> for PhotodexError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::NotFound(message) => PhotodexError::NotFound(message),
            other => PhotodexError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for PhotodexError {
    fn into_response(self) -> Response {
        // Clients see 404 for either kind.
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
