//! Private user endpoints: self profile, detail, list, update, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use warden_core::models::context::Context;
use warden_core::models::user::{ListUsersQuery, Page, UpdateUser, User};
use warden_core::models::UserId;
use warden_core::repository::{PgUserRepository, UserRepository};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserOutput {
  pub id: String,
  pub email: String,
  pub created_at: chrono::DateTime<chrono::Utc>,
  pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserOutput {
  fn from(u: User) -> Self {
    Self {
      id: u.id.to_string(),
      email: u.email,
      created_at: u.created_at,
      updated_at: u.updated_at,
    }
  }
}

pub async fn me_handler(Extension(ctx): Extension<Context>) -> Result<impl IntoResponse, AppError> {
  let user = ctx
    .user
    .ok_or_else(|| AppError::unauthorized("no authenticated user"))?;
  Ok(Json(serde_json::json!({ "id": user.id.to_string(), "email": user.email })))
}

pub async fn get_user_handler(
  State(state): State<AppState>,
  Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.replica_pool().acquire().await.map_err(AppError::from)?;
  let user = PgUserRepository
    .find_by_id(&mut conn, user_id)
    .await?
    .ok_or_else(|| AppError::new(warden_core::error::ErrorKind::NotFound, "user not found"))?;
  Ok(Json(UserOutput::from(user)))
}

pub async fn list_users_handler(
  State(state): State<AppState>,
  Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.replica_pool().acquire().await.map_err(AppError::from)?;
  let limit = query.limit.unwrap_or(20).clamp(1, 100) as i64;
  let page = query.page.unwrap_or(0) as i64;
  let offset = page * limit;
  let order_desc = query
    .order_by
    .as_deref()
    .map(|o| o.eq_ignore_ascii_case("desc"))
    .unwrap_or(false);

  let (users, total) = PgUserRepository
    .list(
      &mut conn,
      query.email.as_deref(),
      query.from_date,
      query.to_date,
      order_desc,
      limit,
      offset,
    )
    .await?;

  Ok(Json(Page {
    items: users.into_iter().map(UserOutput::from).collect::<Vec<_>>(),
    limit: limit as u32,
    offset: offset as u32,
    total,
  }))
}

pub async fn update_user_handler(
  State(state): State<AppState>,
  Path(user_id): Path<UserId>,
  Json(mut input): Json<UpdateUser>,
) -> Result<impl IntoResponse, AppError> {
  input.validate().map_err(AppError::from)?;

  let password_hash = match input.password.take() {
    Some(plain) => Some(state.hasher().hash(&plain)?),
    None => None,
  };

  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  PgUserRepository
    .update(&mut conn, user_id, &input, password_hash)
    .await?;

  Ok(Json(serde_json::json!({ "status": true })))
}

pub async fn delete_user_handler(
  State(state): State<AppState>,
  Path(user_id): Path<UserId>,
) -> Result<impl IntoResponse, AppError> {
  let mut conn = state.master_pool().acquire().await.map_err(AppError::from)?;
  PgUserRepository.delete(&mut conn, user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}
