//! The RBAC permission catalog: resources, actions, fields, and the
//! materialized effective-permission view the request path actually reads.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

use super::ids::{PermissionFieldId, PermissionId, RoleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum Action {
  Read,
  Create,
  Update,
  Delete,
}

/// Where a field-level policy reads request keys from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum Source {
  Query,
  Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum Scope {
  Own,
  Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum Effect {
  Allow,
  Deny,
}

/// The declarative shape a route attaches to itself at registration time
/// (§4.J). `key()` is the canonical identifier used both in the catalog and
/// in the cache/view lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionSpec {
  pub resource: String,
  pub action: Action,
  pub operation: String,
  pub description: Option<String>,
  pub fields: BTreeMap<Source, BTreeSet<String>>,
}

impl PermissionSpec {
  pub fn new(resource: impl Into<String>, action: Action, operation: impl Into<String>) -> Self {
    Self {
      resource: resource.into(),
      action,
      operation: operation.into(),
      description: None,
      fields: BTreeMap::new(),
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_fields(mut self, src: Source, names: impl IntoIterator<Item = &'static str>) -> Self {
    self
      .fields
      .entry(src)
      .or_default()
      .extend(names.into_iter().map(str::to_string));
    self
  }

  /// `lower("resource:action:operation")`, the catalog's natural key.
  pub fn key(&self) -> String {
    format!(
      "{}:{:?}:{}",
      self.resource.to_lowercase(),
      self.action,
      self.operation.to_lowercase()
    )
    .to_lowercase()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Permission {
  pub id: PermissionId,
  pub resource: String,
  pub action: Action,
  pub operation: String,
  pub description: Option<String>,
  pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionField {
  pub id: PermissionFieldId,
  pub permission_id: PermissionId,
  pub src: Source,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
  pub role_id: RoleId,
  pub permission_id: PermissionId,
  pub scope: Scope,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermissionField {
  pub role_id: RoleId,
  pub permission_id: PermissionId,
  pub field_id: PermissionFieldId,
  pub effect: Effect,
}

/// The single row the request path reads for authorization — precomputed
/// by `mv_effective_permissions` (§3.1) from roles/levels so `check_scope`
/// and `check_fields` never need to join across the raw grant tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivePermission {
  pub resource: String,
  pub action: Action,
  pub operation: String,
  pub description: Option<String>,
  pub scope: Scope,
  pub allow_fields: BTreeMap<Source, BTreeSet<String>>,
  pub deny_fields: BTreeMap<Source, BTreeSet<String>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_is_lowercase_and_colon_joined() {
    let spec = PermissionSpec::new("Users", Action::Read, "Detail");
    assert_eq!(spec.key(), "users:read:detail");
  }
}
