//! Warden server — policy-driven authorization HTTP surface.
//!
//! Public API: `AppState`, `AppConfig`, `AppError`, and `get_router` for
//! assembling the axum application.

pub mod config;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod middlewares;
pub mod migration;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::{AppError, ErrorOutput};
pub use state::AppState;

use middlewares::auth::auth_middleware;
use middlewares::cache::{cache_invalidate_middleware, cache_middleware};
use middlewares::context::context_middleware;
use middlewares::rate_limit::public_rate_limit_middleware;
use middlewares::request_id::request_id_middleware;
use middlewares::timeout::timeout_middleware;
use openapi::OpenApiRouter;

/// Builds the full application router.
///
/// Layer order matters: axum runs the most-recently-added `.layer()` first,
/// so `context_middleware` (which every other middleware and handler reads
/// `Context` from) is added last to run first, followed by `auth_middleware`
/// on the private subtree only.
pub fn get_router(state: AppState) -> Router {
  let public_routes = Router::new()
    .route("/users", post(handlers::auth::signup_handler))
    .route("/auth/login", post(handlers::auth::login_handler))
    .route("/auth/logout", post(handlers::auth::logout_handler))
    .route("/auth/refresh", post(handlers::auth::refresh_handler))
    .route_layer(from_fn_with_state(state.clone(), public_rate_limit_middleware));

  let private_routes = Router::new()
    .route("/users/me", get(handlers::users::me_handler))
    .route(
      "/users/{user_id}",
      get(handlers::users::get_user_handler)
        .patch(handlers::users::update_user_handler)
        .delete(handlers::users::delete_user_handler),
    )
    .route("/users", get(handlers::users::list_users_handler))
    .route("/rbac/roles", post(handlers::rbac::create_role_handler))
    .route(
      "/rbac/users/{user_id}/roles",
      get(handlers::rbac::list_user_roles_handler),
    )
    .route(
      "/rbac/users/{user_id}/roles/{role_id}",
      post(handlers::rbac::assign_role_handler),
    )
    .route(
      "/rbac/roles/{role_id}/permissions",
      post(handlers::rbac::grant_permission_handler),
    )
    .route(
      "/rbac/roles/{role_id}/permissions/{permission_id}/fields",
      post(handlers::rbac::grant_permission_field_handler),
    )
    .route_layer(from_fn_with_state(state.clone(), cache_invalidate_middleware))
    .route_layer(from_fn_with_state(state.clone(), cache_middleware))
    .route_layer(from_fn_with_state(state.clone(), auth_middleware));

  let health_routes = Router::new()
    .route("/health", get(handlers::health::health_handler))
    .route("/health/ready", get(handlers::health::readiness_handler));

  let concurrency = concurrency_cap(&state);

  Router::new()
    .nest("/public", public_routes)
    .nest("/private", private_routes)
    .merge(health_routes)
    .openapi()
    .layer(from_fn(context_middleware))
    .layer(from_fn(request_id_middleware))
    .layer(from_fn_with_state(state.clone(), timeout_middleware))
    .layer(TraceLayer::new_for_http())
    .layer(concurrency)
    .with_state(state)
}

/// Concurrency-cap formula (§9.1): only applied with more than one worker,
/// sized so each worker's in-flight requests can't outrun the connections
/// actually available to it across both pools.
fn concurrency_cap(state: &AppState) -> ConcurrencyLimitLayer {
  let workers = state.config().server.resolved_workers().max(1) as u32;
  let per_worker_master = state.config().db.max_connections.div_ceil(workers);
  let per_worker_replica = state.config().db.replica_max_connections.div_ceil(workers);
  let cap = if state.config().server.workers.map(|w| w > 1).unwrap_or(false) {
    (per_worker_master + per_worker_replica) as usize
  } else {
    usize::MAX / 2
  };
  ConcurrencyLimitLayer::new(cap)
}

pub use routes::route_rules;
