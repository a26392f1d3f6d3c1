pub mod context;
pub mod ids;
pub mod permission;
pub mod role;
pub mod user;

pub use context::Context;
pub use ids::{PermissionFieldId, PermissionId, RoleId, UserId};
pub use permission::{
  Action, Effect, EffectivePermission, Permission, PermissionField, PermissionSpec,
  RolePermission, RolePermissionField, Scope, Source,
};
pub use role::{CreateRole, Role, RoleSummary};
pub use user::{AuthUser, CreateUser, ListUsersQuery, Page, SigninUser, UpdateUser, User};
