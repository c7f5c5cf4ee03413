//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use prospect_session::SessionError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or empty x-user-id header")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Session(#[from] SessionError),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Session(e) => match e {
        SessionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::LeadNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::InFlight { .. }
        | SessionError::AlreadySent(_)
        | SessionError::NoDraft(_)
        | SessionError::Superseded(_) => StatusCode::CONFLICT,
        SessionError::RemoteActionFailed(_) => StatusCode::BAD_GATEWAY,
        SessionError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
