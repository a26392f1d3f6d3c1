//! OpenAPI document and documentation-UI routes, in the teacher's
//! `OpenApiRouter` extension-trait style.

use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use warden_core::models::{
  Action, CreateRole, CreateUser, Effect, EffectivePermission, Page, Permission, PermissionField,
  PermissionSpec, Role, RoleSummary, Scope, SigninUser, Source, UpdateUser, User,
};

use crate::error::ErrorOutput;
use crate::handlers::auth::{SignupOutput, StatusOutput, TokenOutput};
use crate::handlers::health::{HealthOutput, ReadinessOutput};
use crate::handlers::rbac::{GrantFieldInput, GrantPermissionInput};
use crate::handlers::users::UserOutput;
use crate::AppState;

#[derive(OpenApi)]
#[openapi(
  components(
    schemas(
      ErrorOutput,
      CreateUser,
      SigninUser,
      UpdateUser,
      User,
      UserOutput,
      Page<UserOutput>,
      SignupOutput,
      TokenOutput,
      StatusOutput,
      CreateRole,
      Role,
      RoleSummary,
      Permission,
      PermissionField,
      PermissionSpec,
      EffectivePermission,
      GrantPermissionInput,
      GrantFieldInput,
      Action,
      Scope,
      Source,
      Effect,
      HealthOutput,
      ReadinessOutput,
    )
  ),
  modifiers(&SecurityAddon),
  tags(
    (name = "auth", description = "Signup, login, logout, refresh"),
    (name = "users", description = "User profile and administration"),
    (name = "rbac", description = "Role and permission administration"),
    (name = "health", description = "Liveness and readiness probes"),
  )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
  fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
    if let Some(components) = openapi.components.as_mut() {
      components.add_security_scheme(
        "access_token",
        SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
      );
      components.add_security_scheme(
        "refresh_cookie",
        SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
      );
    }
  }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
  Json(ApiDoc::openapi())
}

async fn swagger_ui() -> Html<&'static str> {
  Html(
    r#"<!DOCTYPE html>
<html>
<head><title>warden API</title>
<link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5.1.0/swagger-ui.css" /></head>
<body>
<div id="swagger-ui"></div>
<script src="https://unpkg.com/swagger-ui-dist@5.1.0/swagger-ui-bundle.js"></script>
<script>
SwaggerUIBundle({
  url: '/api-docs/openapi.json',
  dom_id: '#swagger-ui',
  presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.presets.standalone],
});
</script>
</body>
</html>"#,
  )
}

pub trait OpenApiRouter {
  fn openapi(self) -> Self;
}

impl OpenApiRouter for Router<AppState> {
  fn openapi(self) -> Self {
    self
      .route("/api-docs/openapi.json", get(openapi_json))
      .route("/swagger-ui", get(swagger_ui))
      .route("/swagger-ui/", get(swagger_ui))
  }
}
