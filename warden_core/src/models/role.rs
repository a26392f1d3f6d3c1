use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::ids::RoleId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
  pub id: RoleId,
  pub name: String,
  pub level: i32,
  pub is_superuser: bool,
}

/// The slice of a `Role` carried on `AuthUser` — no need to round-trip the
/// whole row through the token/session path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleSummary {
  pub id: RoleId,
  pub name: String,
  pub level: i32,
  pub is_superuser: bool,
}

impl From<Role> for RoleSummary {
  fn from(r: Role) -> Self {
    Self {
      id: r.id,
      name: r.name,
      level: r.level,
      is_superuser: r.is_superuser,
    }
  }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRole {
  pub name: String,
  pub level: i32,
  #[serde(default)]
  pub is_superuser: bool,
}
