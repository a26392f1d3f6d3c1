use async_trait::async_trait;
use sqlx::PgConnection;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreError;
use crate::models::permission::{EffectivePermission, Scope, Source};
use crate::models::{CreateRole, Permission, PermissionId, Role, RoleId, UserId};

#[async_trait]
pub trait RbacRepository: Send + Sync {
  async fn roles_for_user(&self, conn: &mut PgConnection, user_id: UserId) -> Result<Vec<Role>, CoreError>;

  async fn create_role(&self, conn: &mut PgConnection, input: &CreateRole) -> Result<Role, CoreError>;
  async fn assign_role(&self, conn: &mut PgConnection, user_id: UserId, role_id: RoleId) -> Result<(), CoreError>;
  async fn grant_permission(
    &self,
    conn: &mut PgConnection,
    role_id: RoleId,
    permission_id: PermissionId,
    scope: Scope,
  ) -> Result<(), CoreError>;

  /// Reads the single materialized row for `(user_id, permission_key)`.
  /// Returns `Ok(None)` when the user has no role granting that permission.
  async fn effective_permission(
    &self,
    conn: &mut PgConnection,
    user_id: UserId,
    permission_key: &str,
  ) -> Result<Option<EffectivePermission>, CoreError>;

  /// Idempotent insert-or-ignore of a permission by its natural key,
  /// returning the row's id either way (§4.I step 3).
  async fn upsert_permission(
    &self,
    conn: &mut PgConnection,
    resource: &str,
    action: crate::models::Action,
    operation: &str,
    description: Option<&str>,
  ) -> Result<Permission, CoreError>;

  async fn upsert_permission_fields(
    &self,
    conn: &mut PgConnection,
    permission_id: PermissionId,
    fields: &BTreeMap<Source, BTreeSet<String>>,
  ) -> Result<(), CoreError>;

  async fn refresh_effective_permissions_view(&self, conn: &mut PgConnection) -> Result<(), CoreError>;
}

pub struct PgRbacRepository;

#[async_trait]
impl RbacRepository for PgRbacRepository {
  async fn roles_for_user(
    &self,
    conn: &mut PgConnection,
    user_id: UserId,
  ) -> Result<Vec<Role>, CoreError> {
    sqlx::query_as::<_, Role>(
      r#"SELECT r.id, r.name, r.level, r.is_superuser
         FROM roles r
         JOIN user_roles ur ON ur.role_id = r.id
         WHERE ur.user_id = $1"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn create_role(
    &self,
    conn: &mut PgConnection,
    input: &CreateRole,
  ) -> Result<Role, CoreError> {
    sqlx::query_as::<_, Role>(
      r#"INSERT INTO roles (id, name, level, is_superuser)
         VALUES (gen_random_uuid(), $1, $2, $3)
         RETURNING id, name, level, is_superuser"#,
    )
    .bind(&input.name)
    .bind(input.level)
    .bind(input.is_superuser)
    .fetch_one(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn assign_role(
    &self,
    conn: &mut PgConnection,
    user_id: UserId,
    role_id: RoleId,
  ) -> Result<(), CoreError> {
    sqlx::query(
      "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(conn)
    .await
    .map_err(CoreError::from)?;
    Ok(())
  }

  async fn grant_permission(
    &self,
    conn: &mut PgConnection,
    role_id: RoleId,
    permission_id: PermissionId,
    scope: Scope,
  ) -> Result<(), CoreError> {
    sqlx::query(
      r#"INSERT INTO role_permissions (role_id, permission_id, scope)
         VALUES ($1, $2, $3)
         ON CONFLICT (role_id, permission_id) DO UPDATE SET scope = EXCLUDED.scope"#,
    )
    .bind(role_id)
    .bind(permission_id)
    .bind(scope)
    .execute(conn)
    .await
    .map_err(CoreError::from)?;
    Ok(())
  }

  async fn effective_permission(
    &self,
    conn: &mut PgConnection,
    user_id: UserId,
    permission_key: &str,
  ) -> Result<Option<EffectivePermission>, CoreError> {
    #[derive(sqlx::FromRow)]
    struct Row {
      resource: String,
      action: crate::models::Action,
      operation: String,
      description: Option<String>,
      scope: Scope,
      allow_fields: serde_json::Value,
      deny_fields: serde_json::Value,
    }

    let row = sqlx::query_as::<_, Row>(
      r#"SELECT resource, action, operation, description, scope, allow_fields, deny_fields
         FROM mv_effective_permissions
         WHERE user_id = $1 AND permission_key = $2"#,
    )
    .bind(user_id)
    .bind(permission_key)
    .fetch_optional(conn)
    .await
    .map_err(CoreError::from)?;

    let Some(row) = row else { return Ok(None) };
    Ok(Some(EffectivePermission {
      resource: row.resource,
      action: row.action,
      operation: row.operation,
      description: row.description,
      scope: row.scope,
      allow_fields: parse_field_map(row.allow_fields),
      deny_fields: parse_field_map(row.deny_fields),
    }))
  }

  async fn upsert_permission(
    &self,
    conn: &mut PgConnection,
    resource: &str,
    action: crate::models::Action,
    operation: &str,
    description: Option<&str>,
  ) -> Result<Permission, CoreError> {
    let key = format!("{}:{:?}:{}", resource.to_lowercase(), action, operation.to_lowercase())
      .to_lowercase();
    sqlx::query_as::<_, Permission>(
      r#"INSERT INTO permissions (id, resource, action, operation, description, key)
         VALUES (gen_random_uuid(), $1, $2, $3, $4, $5)
         ON CONFLICT (key) DO UPDATE SET description = COALESCE(EXCLUDED.description, permissions.description)
         RETURNING id, resource, action, operation, description, key"#,
    )
    .bind(resource)
    .bind(action)
    .bind(operation)
    .bind(description)
    .bind(key)
    .fetch_one(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn upsert_permission_fields(
    &self,
    conn: &mut PgConnection,
    permission_id: PermissionId,
    fields: &BTreeMap<Source, BTreeSet<String>>,
  ) -> Result<(), CoreError> {
    for (src, names) in fields {
      for name in names {
        sqlx::query(
          r#"INSERT INTO permission_fields (id, permission_id, src, name)
             VALUES (gen_random_uuid(), $1, $2, $3)
             ON CONFLICT (permission_id, lower(src), lower(name)) DO NOTHING"#,
        )
        .bind(permission_id)
        .bind(src)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(CoreError::from)?;
      }
    }
    Ok(())
  }

  async fn refresh_effective_permissions_view(
    &self,
    conn: &mut PgConnection,
  ) -> Result<(), CoreError> {
    sqlx::query("REFRESH MATERIALIZED VIEW CONCURRENTLY mv_effective_permissions")
      .execute(conn)
      .await
      .map_err(CoreError::from)?;
    Ok(())
  }
}

fn parse_field_map(value: serde_json::Value) -> BTreeMap<Source, BTreeSet<String>> {
  let Some(obj) = value.as_object() else {
    return BTreeMap::new();
  };
  let mut out = BTreeMap::new();
  for (k, v) in obj {
    let src = match k.to_uppercase().as_str() {
      "QUERY" => Source::Query,
      "JSON" => Source::Json,
      _ => continue,
    };
    let names: BTreeSet<String> = v
      .as_array()
      .map(|a| a.iter().filter_map(|x| x.as_str().map(str::to_string)).collect())
      .unwrap_or_default();
    out.insert(src, names);
  }
  out
}
