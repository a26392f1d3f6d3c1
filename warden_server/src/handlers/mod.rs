pub mod auth;
pub mod health;
pub mod rbac;
pub mod users;
