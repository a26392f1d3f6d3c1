//! `/health` and `/health/ready` — outside the authorization subtree, no
//! `RouteRule` attached (§4.Q).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthOutput {
  pub status: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
  Json(HealthOutput { status: "ok" })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessOutput {
  pub master_db: bool,
  pub replica_db: bool,
  pub cache: bool,
}

pub async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
  let master_db = sqlx::query("SELECT 1").execute(state.master_pool()).await.is_ok();
  let replica_db = sqlx::query("SELECT 1").execute(state.replica_pool()).await.is_ok();
  let cache = state.cache().get("health:probe").await.is_ok();

  let ready = master_db && replica_db && cache;
  let status = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
  (status, Json(ReadinessOutput { master_db, replica_db, cache }))
}
