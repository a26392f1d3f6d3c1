use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::ids::UserId;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct User {
  pub id: UserId,
  pub email: String,
  #[sqlx(default)]
  #[serde(skip)]
  pub password_hash: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The principal attached to a request once the bearer token has been
/// verified and the subject loaded, per §4.H.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
  pub id: UserId,
  pub email: String,
  pub roles: Vec<super::role::RoleSummary>,
}

impl AuthUser {
  pub fn is_superuser(&self) -> bool {
    self.roles.iter().any(|r| r.is_superuser)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
  #[validate(email)]
  pub email: String,
  #[validate(length(min = 8, max = 32))]
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SigninUser {
  #[validate(email)]
  pub email: String,
  pub password: String,
  /// Opaque client fingerprint; salts the refresh-entry hash, never
  /// authenticates by itself (see §4.E).
  pub fingerprint: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema, Default)]
pub struct UpdateUser {
  #[validate(email)]
  pub email: Option<String>,
  #[validate(length(min = 8, max = 32))]
  pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Default)]
pub struct ListUsersQuery {
  pub email: Option<String>,
  pub from_date: Option<DateTime<Utc>>,
  pub to_date: Option<DateTime<Utc>>,
  #[serde(default)]
  pub page: Option<u32>,
  #[serde(default)]
  pub limit: Option<u32>,
  pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub limit: u32,
  pub offset: u32,
  pub total: i64,
}
