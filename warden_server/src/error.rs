use axum::http::StatusCode;
use axum::response::Json;
use axum::{
  body::Body,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::error::{CoreError, ErrorKind, ErrorMapper};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOutput {
  pub code: u16,
  pub error: String,
}

impl ErrorOutput {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      code: StatusCode::BAD_REQUEST.as_u16(),
      error: error.into(),
    }
  }
}

/// HTTP-facing error. Carries the domain failure plus the `ErrorKind` it was
/// classified under, so `IntoResponse` never has to re-derive a status code
/// from the message text.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AppError {
  pub kind: ErrorKind,
  pub message: String,
}

impl AppError {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn invalid_input(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::BadRequest, message)
  }

  pub fn unauthorized(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::Unauthorized, message)
  }
}

impl ErrorMapper for AppError {
  type Error = AppError;

  fn map_error(error: CoreError) -> Self::Error {
    let kind = error.kind();
    Self::new(kind, error.to_string())
  }
}

fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
    ErrorKind::Forbidden => StatusCode::FORBIDDEN,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
    ErrorKind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
    ErrorKind::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
    ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::ServiceNotImplemented => StatusCode::NOT_IMPLEMENTED,
    ErrorKind::AppError => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response<Body> {
    let status = status_for(self.kind);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self.message, "unhandled internal error");
    }
    let code = status.as_u16();
    let body = Json(ErrorOutput {
      code,
      error: self.message,
    });
    (status, body).into_response()
  }
}

impl From<CoreError> for AppError {
  fn from(error: CoreError) -> Self {
    Self::map_error(error)
  }
}

impl From<sqlx::Error> for AppError {
  fn from(error: sqlx::Error) -> Self {
    Self::from(CoreError::from(error))
  }
}

impl From<jsonwebtoken::errors::Error> for AppError {
  fn from(error: jsonwebtoken::errors::Error) -> Self {
    Self::from(CoreError::from(error))
  }
}

impl From<anyhow::Error> for AppError {
  fn from(error: anyhow::Error) -> Self {
    Self::from(CoreError::from(error))
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(error: validator::ValidationErrors) -> Self {
    Self::new(ErrorKind::BadRequest, error.to_string())
  }
}

impl From<axum::http::header::InvalidHeaderValue> for AppError {
  fn from(error: axum::http::header::InvalidHeaderValue) -> Self {
    Self::new(ErrorKind::UnprocessableEntity, error.to_string())
  }
}
