//! Per-route permission attachment and its resolvers (component J).
//!
//! Each protected route is paired with a `RouteRule` at registration time.
//! The auth middleware (component K) resolves the caller's
//! `EffectivePermission` for `rule.permission.key()` and then runs
//! `rule.check_scope` and `rule.check_fields` against it.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::models::context::Context;
use crate::models::permission::{EffectivePermission, PermissionSpec, Scope, Source};

/// Field-level enforcement policy, chosen per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
  /// No field-level restriction.
  AllowAll,
  /// Forbid any request key present in the permission's deny set.
  DenyList,
  /// Forbid any request key absent from the permission's allow set.
  AllowList,
  /// `DenyList` then `AllowList`.
  Mixed,
}

impl FieldPolicy {
  pub fn check(&self, permission: &EffectivePermission, ctx: &Context) -> Result<(), CoreError> {
    match self {
      FieldPolicy::AllowAll => Ok(()),
      FieldPolicy::DenyList => check_deny_list(permission, ctx),
      FieldPolicy::AllowList => check_allow_list(permission, ctx),
      FieldPolicy::Mixed => {
        check_deny_list(permission, ctx)?;
        check_allow_list(permission, ctx)
      }
    }
  }
}

fn check_deny_list(permission: &EffectivePermission, ctx: &Context) -> Result<(), CoreError> {
  for src in [Source::Query, Source::Json] {
    let deny = permission.deny_fields.get(&src).cloned().unwrap_or_default();
    if deny.is_empty() {
      continue;
    }
    let requested = ctx.keys(src);
    let hit: BTreeSet<_> = requested.intersection(&deny).cloned().collect();
    if !hit.is_empty() {
      return Err(CoreError::Forbidden(format!(
        "field(s) {:?} are denied on {:?}",
        hit, src
      )));
    }
  }
  Ok(())
}

fn check_allow_list(permission: &EffectivePermission, ctx: &Context) -> Result<(), CoreError> {
  for src in [Source::Query, Source::Json] {
    let Some(allow) = permission.allow_fields.get(&src) else {
      continue;
    };
    let requested = ctx.keys(src);
    let extra: BTreeSet<_> = requested.difference(allow).cloned().collect();
    if !extra.is_empty() {
      return Err(CoreError::Forbidden(format!(
        "field(s) {:?} are not allowed on {:?}",
        extra, src
      )));
    }
  }
  Ok(())
}

/// Scope enforcement policy, chosen per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeResolver {
  /// `Scope::Own` requires `ctx.user.id == path_params["user_id"]`.
  ByUserId,
  /// `Scope::Own` requires `ctx.user.email == query_params["email"]`
  /// (case-insensitive).
  ByUserEmail,
}

impl ScopeResolver {
  pub fn check(&self, ctx: &Context, scope: Scope) -> Result<(), CoreError> {
    if scope == Scope::Any {
      return Ok(());
    }
    let Some(user) = &ctx.user else {
      return Err(CoreError::Forbidden("no authenticated user in scope".into()));
    };
    match self {
      ScopeResolver::ByUserId => {
        let requested = ctx.path_param("user_id");
        match requested {
          Some(id) if id == user.id.to_string() => Ok(()),
          _ => Err(CoreError::Forbidden(
            "scope OWN requires acting on your own user_id".into(),
          )),
        }
      }
      ScopeResolver::ByUserEmail => {
        let requested = ctx.query_param("email");
        match requested {
          Some(email) if email.eq_ignore_ascii_case(&user.email) => Ok(()),
          _ => Err(CoreError::Forbidden(
            "scope OWN requires filtering by your own email".into(),
          )),
        }
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct RouteRule {
  pub permission: PermissionSpec,
  pub check_fields: FieldPolicy,
  pub check_scope: ScopeResolver,
}

impl RouteRule {
  pub fn new(permission: PermissionSpec, check_fields: FieldPolicy, check_scope: ScopeResolver) -> Self {
    Self {
      permission,
      check_fields,
      check_scope,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::permission::Action;
  use serde_json::json;
  use std::collections::BTreeMap;

  fn ctx_with_json(json: serde_json::Value) -> Context {
    Context {
      user: None,
      request_id: "r1".into(),
      request_method: "PATCH".into(),
      request_path: "/private/users/self".into(),
      request_url: "http://x/private/users/self".into(),
      request_path_params: json!({}),
      request_query_params: json!({}),
      request_json_params: json,
    }
  }

  fn permission_with_deny(fields: &[&str]) -> EffectivePermission {
    let mut deny = BTreeMap::new();
    deny.insert(
      Source::Json,
      fields.iter().map(|s| s.to_string()).collect(),
    );
    EffectivePermission {
      resource: "users".into(),
      action: Action::Update,
      operation: "update".into(),
      description: None,
      scope: Scope::Own,
      allow_fields: BTreeMap::new(),
      deny_fields: deny,
    }
  }

  #[test]
  fn deny_list_blocks_denied_field() {
    let permission = permission_with_deny(&["password"]);
    let ctx = ctx_with_json(json!({"password": "x"}));
    assert!(FieldPolicy::DenyList.check(&permission, &ctx).is_err());
  }

  #[test]
  fn deny_list_allows_other_fields() {
    let permission = permission_with_deny(&["password"]);
    let ctx = ctx_with_json(json!({"email": "x@y.z"}));
    assert!(FieldPolicy::DenyList.check(&permission, &ctx).is_ok());
  }
}
