//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] calm_engine::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    use calm_engine::Error as E;

    let status = match &self {
      ApiError::NotFound(_) | ApiError::Engine(E::StoryNotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) | ApiError::Engine(E::Core(_)) => StatusCode::BAD_REQUEST,
      ApiError::Engine(E::Conflict { .. }) => StatusCode::CONFLICT,
      ApiError::Engine(E::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
