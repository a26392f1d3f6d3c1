//! Builds the immutable per-request `Context` (component N) and attaches it
//! to the request's extensions so the auth middleware and handlers share a
//! single parsed view of path/query/json params.
//!
//! Must run as a `route_layer` (after axum has matched the route) so the
//! `Path`/`MatchedPath` extractors have params to read.

use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::extract::{FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use warden_core::models::context::Context;

use crate::error::AppError;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn context_middleware(req: Request, next: Next) -> Response {
  match build_context(req).await {
    Ok(req) => next.run(req).await,
    Err(err) => err.into_response(),
  }
}

async fn build_context(req: Request) -> Result<Request, AppError> {
  let method = req.method().to_string();
  let path = req.uri().path().to_string();
  let url = req.uri().to_string();
  let request_id = req
    .headers()
    .get(super::REQUEST_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string();

  let query_params = parse_query(req.uri().query().unwrap_or(""));

  let (mut parts, body) = req.into_parts();
  let path_params = extract_path_params(&mut parts).await;

  let bytes = to_bytes(body, MAX_BODY_BYTES)
    .await
    .map_err(|e| AppError::invalid_input(format!("failed to read request body: {e}")))?;
  let json_params: Value = if bytes.is_empty() {
    Value::Object(Default::default())
  } else {
    serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::Object(Default::default()))
  };

  let ctx = Context {
    user: None,
    request_id,
    request_method: method,
    request_path: path,
    request_url: url,
    request_path_params: path_params,
    request_query_params: query_params,
    request_json_params: json_params,
  };
  parts.extensions.insert(ctx);

  let req = Request::from_parts(parts, Body::from(bytes));
  Ok(req)
}

fn parse_query(raw: &str) -> Value {
  if raw.is_empty() {
    return Value::Object(Default::default());
  }
  serde_qs::from_str::<Value>(raw).unwrap_or_else(|_| Value::Object(Default::default()))
}

async fn extract_path_params(parts: &mut Parts) -> Value {
  match <Path<HashMap<String, String>> as FromRequestParts<()>>::from_request_parts(parts, &())
    .await
  {
    Ok(Path(map)) => serde_json::to_value(map).unwrap_or_else(|_| Value::Object(Default::default())),
    Err(_) => Value::Object(Default::default()),
  }
}
