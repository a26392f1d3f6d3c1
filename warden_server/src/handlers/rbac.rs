//! RBAC administration endpoints: roles, role-permission grants, and
//! role-permission-field grants (§6's `/private/rbac/*` CRUD surface).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use warden_core::models::permission::{Action, Effect, Scope, Source};
use warden_core::models::{CreateRole, PermissionId, RoleId, UserId};
use warden_core::repository::{PgRbacRepository, RbacRepository};

use crate::error::AppError;
use crate::state::AppState;

pub async fn create_role_handler(
  State(state): State<AppState>,
  Json(input): Json<CreateRole>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  let role = PgRbacRepository.create_role(&mut conn, &input).await?;
  Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": role.id.to_string() }))))
}

pub async fn list_user_roles_handler(
  State(state): State<AppState>,
  Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.replica_pool().acquire().await.map_err(AppError::from)?;
  let roles = PgRbacRepository.roles_for_user(&mut conn, user_id).await?;
  Ok(Json(roles))
}

pub async fn assign_role_handler(
  State(state): State<AppState>,
  Path((user_id, role_id)): Path<(UserId, RoleId)>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  PgRbacRepository.assign_role(&mut conn, user_id, role_id).await?;
  Ok(Json(serde_json::json!({ "status": true })))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantPermissionInput {
  pub resource: String,
  pub action: Action,
  pub operation: String,
  pub description: Option<String>,
  pub scope: Scope,
}

pub async fn grant_permission_handler(
  State(state): State<AppState>,
  Path(role_id): Path<RoleId>,
  Json(input): Json<GrantPermissionInput>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  let permission = PgRbacRepository
    .upsert_permission(
      &mut conn,
      &input.resource,
      input.action,
      &input.operation,
      input.description.as_deref(),
    )
    .await?;
  PgRbacRepository
    .grant_permission(&mut conn, role_id, permission.id, input.scope)
    .await?;
  PgRbacRepository.refresh_effective_permissions_view(&mut conn).await?;
  Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": permission.id.to_string() }))))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GrantFieldInput {
  pub src: Source,
  pub name: String,
  pub effect: Effect,
}

pub async fn grant_permission_field_handler(
  State(state): State<AppState>,
  Path((role_id, permission_id)): Path<(RoleId, PermissionId)>,
  Json(input): Json<GrantFieldInput>,
) -> Result<impl IntoResponse, AppError> {
  use std::collections::{BTreeMap, BTreeSet};

  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;

  // `upsert_permission_fields` registers the field on the permission catalog;
  // the role-level ALLOW/DENY grant is recorded against it separately below.
  let mut fields = BTreeMap::new();
  fields.insert(input.src, BTreeSet::from([input.name.clone()]));
  PgRbacRepository
    .upsert_permission_fields(&mut conn, permission_id, &fields)
    .await?;

  sqlx::query(
    r#"INSERT INTO role_permission_fields (role_id, permission_id, field_id, effect)
       SELECT $1, $2, pf.id, $3
       FROM permission_fields pf
       WHERE pf.permission_id = $2 AND pf.src = $4 AND lower(pf.name) = lower($5)
       ON CONFLICT (role_id, permission_id, field_id) DO UPDATE SET effect = EXCLUDED.effect"#,
  )
  .bind(role_id)
  .bind(permission_id)
  .bind(input.effect)
  .bind(input.src)
  .bind(&input.name)
  .execute(&mut *conn)
  .await
  .map_err(warden_core::error::CoreError::from)?;

  PgRbacRepository.refresh_effective_permissions_view(&mut conn).await?;
  Ok(Json(serde_json::json!({ "status": true })))
}
