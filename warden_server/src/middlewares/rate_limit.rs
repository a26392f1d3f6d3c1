//! Fixed-window rate limit for the public (unauthenticated) subtree: 5
//! requests per minute per client IP.
//!
//! Built on the existing `Cache` trait rather than a dedicated limiter
//! crate — a single `get`/`set` round trip per request is enough for a
//! fixed 60s window and avoids introducing a dependency the rest of the
//! stack doesn't otherwise need.

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

use warden_core::error::ErrorKind;

use crate::error::AppError;
use crate::state::AppState;

const WINDOW_SECS: u64 = 60;
const MAX_REQUESTS: u32 = 5;

pub async fn public_rate_limit_middleware(
  State(state): State<AppState>,
  req: Request,
  next: Next,
) -> Response {
  let client = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ci| ci.0.ip().to_string())
    .unwrap_or_else(|| "unknown".to_string());
  let key = format!("ratelimit:public:{client}");

  let count = match state.cache().get(&key).await {
    Ok(Some(v)) => v.parse::<u32>().unwrap_or(0),
    _ => 0,
  };

  if count >= MAX_REQUESTS {
    return AppError::new(ErrorKind::TooManyRequests, "rate limit exceeded, try again later")
      .into_response();
  }

  if let Err(e) = state.cache().set(&key, &(count + 1).to_string(), Some(WINDOW_SECS)).await {
    tracing::warn!(error = %e, "failed to update rate limit counter");
  }

  next.run(req).await
}
