//! Per-request deadline, read from `ServerConfig::request_timeout_ms`.
//!
//! Implemented as a plain middleware function rather than `tower::timeout`'s
//! `TimeoutLayer`, since that layer's `Elapsed` error type doesn't satisfy
//! axum's `Error: Into<Infallible>` bound on `Router::layer` without an
//! extra `HandleErrorLayer` wrapper.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

pub async fn timeout_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
  let deadline = state.config().server.request_timeout();
  match tokio::time::timeout(deadline, next.run(req)).await {
    Ok(res) => res,
    Err(_) => AppError::new(
      warden_core::error::ErrorKind::RequestTimeout,
      "request exceeded the configured timeout",
    )
    .into_response(),
  }
}
