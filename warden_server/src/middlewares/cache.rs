//! Epoch-indexed response cache (component L).
//!
//! Reads are served from `"{epoch}:{cache_key_builder(ctx)}"`; any mutation
//! that runs through `cache_invalidate_middleware` bumps `cache:epoch`
//! afterwards, pushing every reader still using the old epoch's keys into
//! natural TTL expiry rather than requiring an explicit sweep.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use warden_core::models::context::Context;

use crate::state::AppState;

const EPOCH_KEY: &str = "cache:epoch";
const EPOCH_MODULUS: i64 = 1_000_000;
const DEFAULT_TTL_SECS: u64 = 60;
const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

fn cache_key_builder(ctx: &Context) -> String {
  let mut pairs: Vec<(String, String)> = ctx
    .request_query_params
    .as_object()
    .map(|m| {
      m.iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
        .collect()
    })
    .unwrap_or_default();
  pairs.sort();
  let query = serde_qs::to_string(&pairs).unwrap_or_default();
  let user_id = ctx
    .user
    .as_ref()
    .map(|u| u.id.as_hex())
    .unwrap_or_else(|| "anon".to_string());
  format!("{}|{}|{}|{}", ctx.request_method, ctx.request_path, query, user_id)
}

async fn current_epoch(state: &AppState) -> i64 {
  let raw = state.cache().get(EPOCH_KEY).await.ok().flatten();
  raw.and_then(|v| v.parse::<i64>().ok()).unwrap_or(0) % EPOCH_MODULUS
}

pub async fn cache_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
  if req.method() != axum::http::Method::GET {
    return next.run(req).await;
  }
  let Some(ctx) = req.extensions().get::<Context>().cloned() else {
    return next.run(req).await;
  };
  let epoch = current_epoch(&state).await;
  let key = format!("{epoch}:{}", cache_key_builder(&ctx));

  if let Ok(Some(cached)) = state.cache().get(&key).await {
    if let Some((content_type, body)) = cached.split_once('\n') {
      tracing::debug!(cache_key = %key, "cache hit");
      let mut res = Response::new(Body::from(body.to_string()));
      if let Ok(value) = HeaderValue::from_str(content_type) {
        res.headers_mut().insert(axum::http::header::CONTENT_TYPE, value);
      }
      return res;
    }
  }

  let res = next.run(req).await;
  if res.status() != StatusCode::OK {
    return res;
  }
  let content_type = res
    .headers()
    .get(axum::http::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or("application/json")
    .to_string();
  let (parts, body) = res.into_parts();
  let Ok(bytes) = to_bytes(body, MAX_CACHED_BODY_BYTES).await else {
    return Response::from_parts(parts, Body::empty());
  };
  if !bytes.is_empty() {
    let stored = format!("{content_type}\n{}", String::from_utf8_lossy(&bytes));
    let _ = state.cache().set(&key, &stored, Some(DEFAULT_TTL_SECS)).await;
  }
  Response::from_parts(parts, Body::from(bytes))
}

pub async fn cache_invalidate_middleware(
  State(state): State<AppState>,
  req: Request,
  next: Next,
) -> Response {
  let res = next.run(req).await;
  if res.status().is_success() {
    if let Err(e) = state.cache().increment(EPOCH_KEY, 1).await {
      tracing::warn!(error = %e, "failed to bump cache epoch after mutation");
    }
  }
  res
}
