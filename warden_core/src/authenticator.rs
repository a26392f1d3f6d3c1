//! Principal resolution and effective-permission lookup (component H).

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::error::CoreError;
use crate::models::permission::{EffectivePermission, PermissionSpec};
use crate::models::user::AuthUser;
use crate::models::UserId;
use crate::repository::{RbacRepository, UserRepository};

#[async_trait]
pub trait Authenticator: Send + Sync {
  async fn authenticate(&self, conn: &mut PgConnection, user_id: UserId) -> Result<AuthUser, CoreError>;

  async fn get_permission_for(
    &self,
    conn: &mut PgConnection,
    user: &AuthUser,
    spec: &PermissionSpec,
  ) -> Result<EffectivePermission, CoreError>;
}

pub struct DefaultAuthenticator<'a> {
  pub user_repo: &'a dyn UserRepository,
  pub rbac_repo: &'a dyn RbacRepository,
}

#[async_trait]
impl Authenticator for DefaultAuthenticator<'_> {
  async fn authenticate(
    &self,
    conn: &mut PgConnection,
    user_id: UserId,
  ) -> Result<AuthUser, CoreError> {
    let user = self
      .user_repo
      .find_by_id(conn, user_id)
      .await?
      .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
    let roles = self.rbac_repo.roles_for_user(conn, user_id).await?;
    Ok(AuthUser {
      id: user.id,
      email: user.email,
      roles: roles.into_iter().map(Into::into).collect(),
    })
  }

  async fn get_permission_for(
    &self,
    conn: &mut PgConnection,
    user: &AuthUser,
    spec: &PermissionSpec,
  ) -> Result<EffectivePermission, CoreError> {
    self
      .rbac_repo
      .effective_permission(conn, user.id, &spec.key())
      .await?
      .ok_or_else(|| CoreError::Forbidden(format!("no role grants {}", spec.key())))
  }
}
