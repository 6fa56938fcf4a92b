//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use incident_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] incident_core::Error),

  /// Undecodable body, missing required field or unknown enum value.
  #[error("invalid request body: {}", .0.body_text())]
  Body(#[from] JsonRejection),

  #[error("invalid query string: {}", .0.body_text())]
  Query(#[from] QueryRejection),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Body(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
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

#[cfg(test)]
mod tests {
  use incident_core::Error;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn core_kinds_map_to_status_codes() {
    let bad = ApiError::from(Error::MissingField("title"));
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let missing = ApiError::from(Error::IncidentNotFound(Uuid::nil()));
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let io = std::io::Error::other("disk gone");
    let storage = ApiError::from(Error::storage(io));
    assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(storage.to_string(), "store error: disk gone");
  }
}
