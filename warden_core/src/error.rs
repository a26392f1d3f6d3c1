use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use thiserror::Error;

/// The fixed error-kind taxonomy every domain failure collapses into.
///
/// This is the only vocabulary the HTTP layer needs to pick a status code;
/// it never inspects the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
  Unauthorized,
  Forbidden,
  NotFound,
  Conflict,
  BadRequest,
  TooManyRequests,
  RequestTimeout,
  UnprocessableEntity,
  ServiceUnavailable,
  ServiceNotImplemented,
  AppError,
}

/// Core domain error type. Every repository, authenticator, and bus method
/// returns `crate::result::AppResult<T>` = `Result<T, CoreError>`.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CoreError {
  #[error("database error: {0}")]
  Database(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("too many requests: {0}")]
  TooManyRequests(String),

  #[error("request timeout: {0}")]
  RequestTimeout(String),

  #[error("unprocessable entity: {0}")]
  UnprocessableEntity(String),

  #[error("service unavailable: {0}")]
  ServiceUnavailable(String),

  #[error("not implemented: {0}")]
  ServiceNotImplemented(String),

  #[error("user already exists: {0}")]
  UserAlreadyExists(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("role not found: {0}")]
  RoleNotFound(String),

  #[error("permission not found: {0}")]
  PermissionNotFound(String),

  #[error("referenced resource not found: {0}")]
  ForeignKeyViolation(String),

  #[error("resource already exists: {0}")]
  UniqueViolation(String),

  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("invalid or expired token: {0}")]
  InvalidToken(String),

  #[error("lock timeout: {0}")]
  LockTimeout(String),

  #[error("unimplemented: {0}")]
  Unimplemented(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl CoreError {
  pub fn kind(&self) -> ErrorKind {
    use CoreError::*;
    match self {
      Unauthorized(_) | InvalidCredentials | InvalidToken(_) => ErrorKind::Unauthorized,
      Forbidden(_) => ErrorKind::Forbidden,
      NotFound(_) | UserNotFound(_) | RoleNotFound(_) | PermissionNotFound(_) => {
        ErrorKind::NotFound
      }
      Conflict(_) | UserAlreadyExists(_) | UniqueViolation(_) => ErrorKind::Conflict,
      Validation(_) | ForeignKeyViolation(_) => ErrorKind::BadRequest,
      TooManyRequests(_) => ErrorKind::TooManyRequests,
      RequestTimeout(_) | LockTimeout(_) => ErrorKind::RequestTimeout,
      UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
      ServiceUnavailable(_) => ErrorKind::ServiceUnavailable,
      ServiceNotImplemented(_) | Unimplemented(_) => ErrorKind::ServiceNotImplemented,
      Database(_) | Internal(_) => ErrorKind::AppError,
    }
  }

  /// Map sqlx database errors to specific CoreError variants.
  pub fn from_database_error(error: sqlx::Error) -> Self {
    if let Some(db_err) = error.as_database_error() {
      if db_err.is_foreign_key_violation() {
        return Self::map_foreign_key_error(&error.to_string());
      }
      if db_err.is_unique_violation() {
        return Self::map_unique_constraint_error(&error.to_string());
      }
      if db_err.is_check_violation() {
        return CoreError::Validation(format!("data validation failed: {}", db_err.message()));
      }
    }
    CoreError::Database(error.to_string())
  }

  fn map_foreign_key_error(error_msg: &str) -> Self {
    if error_msg.contains("user_roles_user_id_fkey") {
      CoreError::UserNotFound("cannot assign role: user does not exist".into())
    } else if error_msg.contains("user_roles_role_id_fkey") {
      CoreError::RoleNotFound("cannot assign role: role does not exist".into())
    } else if error_msg.contains("role_permissions_permission_id_fkey") {
      CoreError::PermissionNotFound("cannot grant permission: permission does not exist".into())
    } else {
      CoreError::ForeignKeyViolation(format!("referenced resource not found: {error_msg}"))
    }
  }

  fn map_unique_constraint_error(error_msg: &str) -> Self {
    if error_msg.contains("users_email_key") {
      CoreError::UserAlreadyExists("a user with this email already exists".into())
    } else if error_msg.contains("roles_name_key") {
      CoreError::Conflict("a role with this name already exists".into())
    } else if error_msg.contains("permissions_key_key") {
      CoreError::Conflict("a permission with this key already exists".into())
    } else {
      CoreError::UniqueViolation(format!("resource already exists: {error_msg}"))
    }
  }
}

impl From<sqlx::Error> for CoreError {
  fn from(err: sqlx::Error) -> Self {
    CoreError::from_database_error(err)
  }
}

impl From<jsonwebtoken::errors::Error> for CoreError {
  fn from(err: jsonwebtoken::errors::Error) -> Self {
    CoreError::InvalidToken(err.to_string())
  }
}

impl From<anyhow::Error> for CoreError {
  fn from(err: anyhow::Error) -> Self {
    CoreError::Internal(err.to_string())
  }
}

impl From<redis::RedisError> for CoreError {
  fn from(err: redis::RedisError) -> Self {
    CoreError::ServiceUnavailable(err.to_string())
  }
}

/// Translates a `CoreError` into whatever error representation the calling
/// layer needs (the HTTP layer maps it into its `AppError`).
pub trait ErrorMapper {
  type Error;

  fn map_error(error: CoreError) -> Self::Error;
}

pub trait TryFromRow<T>: Sized {
  fn try_from_row(row: PgRow) -> Result<Self, CoreError>;
}

impl<T, E> TryFromRow<PgRow> for T
where
  T: TryFrom<PgRow, Error = E>,
  E: Into<CoreError>,
{
  fn try_from_row(row: PgRow) -> Result<Self, CoreError> {
    T::try_from(row).map_err(Into::into)
  }
}
