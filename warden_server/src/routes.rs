//! Route-to-permission attachment (component J).
//!
//! Every protected route is paired here with the `RouteRule` the auth
//! middleware looks up by `"{METHOD} {axum-matched-path}"`. Routes with no
//! entry in this table (e.g. `/private/users/me`, `/health`) are reachable
//! by any authenticated caller with no further scope/field enforcement.

use std::collections::HashMap;

use warden_core::models::permission::{Action, PermissionSpec, Source};
use warden_core::route_rule::{FieldPolicy, RouteRule, ScopeResolver};

pub fn route_rules() -> HashMap<String, RouteRule> {
  let mut rules = HashMap::new();

  rules.insert(
    "GET /private/users/{user_id}".to_string(),
    RouteRule::new(
      PermissionSpec::new("users", Action::Read, "detail")
        .with_description("read a single user's profile"),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "GET /private/users".to_string(),
    RouteRule::new(
      PermissionSpec::new("users", Action::Read, "list")
        .with_description("list users, optionally filtered by email")
        .with_fields(
          Source::Query,
          ["email", "from_date", "to_date", "page", "limit", "order_by"],
        ),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserEmail,
    ),
  );

  rules.insert(
    "PATCH /private/users/{user_id}".to_string(),
    RouteRule::new(
      PermissionSpec::new("users", Action::Update, "update")
        .with_description("update a user's email or password")
        .with_fields(Source::Json, ["email", "password"]),
      FieldPolicy::DenyList,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "DELETE /private/users/{user_id}".to_string(),
    RouteRule::new(
      PermissionSpec::new("users", Action::Delete, "delete")
        .with_description("delete a user account"),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "POST /private/rbac/roles".to_string(),
    RouteRule::new(
      PermissionSpec::new("roles", Action::Create, "create")
        .with_description("create a role")
        .with_fields(Source::Json, ["name", "level", "is_superuser"]),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "GET /private/rbac/users/{user_id}/roles".to_string(),
    RouteRule::new(
      PermissionSpec::new("roles", Action::Read, "list")
        .with_description("list the roles assigned to a user"),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "POST /private/rbac/users/{user_id}/roles/{role_id}".to_string(),
    RouteRule::new(
      PermissionSpec::new("roles", Action::Update, "assign")
        .with_description("assign a role to a user"),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "POST /private/rbac/roles/{role_id}/permissions".to_string(),
    RouteRule::new(
      PermissionSpec::new("roles", Action::Update, "grant")
        .with_description("grant a permission to a role, with its scope")
        .with_fields(Source::Json, ["resource", "action", "operation", "description", "scope"]),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules.insert(
    "POST /private/rbac/roles/{role_id}/permissions/{permission_id}/fields".to_string(),
    RouteRule::new(
      PermissionSpec::new("roles", Action::Update, "grant_field")
        .with_description("grant a field-level allow/deny effect to a role's permission")
        .with_fields(Source::Json, ["src", "name", "effect"]),
      FieldPolicy::AllowAll,
      ScopeResolver::ByUserId,
    ),
  );

  rules
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn user_detail_route_is_scoped_by_path_user_id() {
    let rules = route_rules();
    let rule = rules.get("GET /private/users/{user_id}").unwrap();
    assert_eq!(rule.check_scope, ScopeResolver::ByUserId);
  }

  #[test]
  fn user_list_route_is_scoped_by_email_query_param() {
    let rules = route_rules();
    let rule = rules.get("GET /private/users").unwrap();
    assert_eq!(rule.check_scope, ScopeResolver::ByUserEmail);
  }

  #[test]
  fn user_update_route_uses_deny_list_field_policy() {
    let rules = route_rules();
    let rule = rules.get("PATCH /private/users/{user_id}").unwrap();
    assert_eq!(rule.check_fields, FieldPolicy::DenyList);
  }
}
