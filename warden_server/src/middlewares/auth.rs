//! Auth middleware (component K): the seven-step sequence that turns a
//! bearer token into an authorization decision for the protected subtree.

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use warden_core::authenticator::{Authenticator, DefaultAuthenticator};
use warden_core::error::{CoreError, ErrorKind};
use warden_core::jwt::TokenType;
use warden_core::models::context::Context;
use warden_core::models::UserId;
use warden_core::repository::{PgRbacRepository, PgUserRepository};

use crate::error::AppError;
use crate::state::AppState;

pub async fn auth_middleware(
  State(state): State<AppState>,
  mut req: Request,
  next: Next,
) -> Result<Response, AppError> {
  let ctx = req
    .extensions()
    .get::<Context>()
    .cloned()
    .ok_or_else(|| AppError::new(ErrorKind::AppError, "context middleware did not run"))?;

  // 1-2: extract and verify the bearer access token.
  let token = bearer_token(&req)?;
  let claims = state
    .jwt()
    .verify(&token, TokenType::Access)
    .map_err(|_| AppError::unauthorized("missing or invalid access token"))?;
  let user_id: UserId = claims
    .sub
    .parse::<uuid::Uuid>()
    .map(Into::into)
    .map_err(|_| AppError::unauthorized("invalid subject in access token"))?;

  let user_repo = PgUserRepository;
  let rbac_repo = PgRbacRepository;
  let authenticator = DefaultAuthenticator {
    user_repo: &user_repo,
    rbac_repo: &rbac_repo,
  };

  let mut conn = state.replica_pool().acquire().await.map_err(AppError::from)?;

  // 3: load the principal; no roles at all is a hard Forbidden.
  let user = authenticator.authenticate(&mut conn, user_id).await?;
  if user.roles.is_empty() {
    return Err(AppError::new(
      ErrorKind::Forbidden,
      "authenticated user has no roles assigned",
    ));
  }

  let mut authed_ctx = ctx.clone();
  authed_ctx.user = Some(user.clone());

  // 4: superuser short-circuits every check below.
  if user.is_superuser() {
    req.extensions_mut().insert(authed_ctx);
    return Ok(next.run(req).await);
  }

  // 5: no RouteRule on this route means authenticated access is enough.
  let matched_path = req
    .extensions()
    .get::<MatchedPath>()
    .map(|m| m.as_str().to_string());
  let rule = matched_path
    .as_deref()
    .and_then(|path| state.route_rule(req.method().as_str(), path));

  let Some(rule) = rule else {
    req.extensions_mut().insert(authed_ctx);
    return Ok(next.run(req).await);
  };

  // 6: resolve the caller's effective permission for this route.
  let permission = authenticator
    .get_permission_for(&mut conn, &user, &rule.permission)
    .await
    .map_err(|_: CoreError| {
      AppError::new(
        ErrorKind::Forbidden,
        format!("no role grants {}", rule.permission.key()),
      )
    })?;

  // 7: scope then field-level enforcement.
  rule.check_scope.check(&authed_ctx, permission.scope)?;
  rule.check_fields.check(&permission, &authed_ctx)?;

  req.extensions_mut().insert(authed_ctx);
  Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Result<String, AppError> {
  let header = req
    .headers()
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;
  header
    .strip_prefix("Bearer ")
    .map(str::to_string)
    .ok_or_else(|| AppError::unauthorized("Authorization header is not a Bearer token"))
}
