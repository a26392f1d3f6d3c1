use async_trait::async_trait;
use sqlx::PgConnection;

use crate::error::CoreError;
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::models::UserId;

#[async_trait]
pub trait UserRepository: Send + Sync {
  async fn create(&self, conn: &mut PgConnection, input: &CreateUser, password_hash: &str) -> Result<User, CoreError>;
  async fn find_by_id(&self, conn: &mut PgConnection, id: UserId) -> Result<Option<User>, CoreError>;
  async fn find_by_email(&self, conn: &mut PgConnection, email: &str) -> Result<Option<User>, CoreError>;
  async fn update(&self, conn: &mut PgConnection, id: UserId, input: &UpdateUser, password_hash: Option<String>) -> Result<User, CoreError>;
  async fn delete(&self, conn: &mut PgConnection, id: UserId) -> Result<(), CoreError>;
  async fn list(
    &self,
    conn: &mut PgConnection,
    email_filter: Option<&str>,
    from_date: Option<chrono::DateTime<chrono::Utc>>,
    to_date: Option<chrono::DateTime<chrono::Utc>>,
    order_desc: bool,
    limit: i64,
    offset: i64,
  ) -> Result<(Vec<User>, i64), CoreError>;
}

pub struct PgUserRepository;

#[async_trait]
impl UserRepository for PgUserRepository {
  async fn create(
    &self,
    conn: &mut PgConnection,
    input: &CreateUser,
    password_hash: &str,
  ) -> Result<User, CoreError> {
    sqlx::query_as::<_, User>(
      r#"INSERT INTO users (id, email, password_hash, created_at, updated_at)
         VALUES (gen_random_uuid(), $1, $2, now(), now())
         RETURNING id, email, password_hash, created_at, updated_at"#,
    )
    .bind(input.email.to_lowercase())
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn find_by_id(
    &self,
    conn: &mut PgConnection,
    id: UserId,
  ) -> Result<Option<User>, CoreError> {
    sqlx::query_as::<_, User>(
      "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn find_by_email(
    &self,
    conn: &mut PgConnection,
    email: &str,
  ) -> Result<Option<User>, CoreError> {
    sqlx::query_as::<_, User>(
      "SELECT id, email, password_hash, created_at, updated_at FROM users WHERE email = $1",
    )
    .bind(email.to_lowercase())
    .fetch_optional(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn update(
    &self,
    conn: &mut PgConnection,
    id: UserId,
    input: &UpdateUser,
    password_hash: Option<String>,
  ) -> Result<User, CoreError> {
    sqlx::query_as::<_, User>(
      r#"UPDATE users SET
           email = COALESCE($2, email),
           password_hash = COALESCE($3, password_hash),
           updated_at = now()
         WHERE id = $1
         RETURNING id, email, password_hash, created_at, updated_at"#,
    )
    .bind(id)
    .bind(input.email.as_ref().map(|e| e.to_lowercase()))
    .bind(password_hash)
    .fetch_one(conn)
    .await
    .map_err(CoreError::from)
  }

  async fn delete(&self, conn: &mut PgConnection, id: UserId) -> Result<(), CoreError> {
    sqlx::query("DELETE FROM users WHERE id = $1")
      .bind(id)
      .execute(conn)
      .await
      .map_err(CoreError::from)?;
    Ok(())
  }

  async fn list(
    &self,
    conn: &mut PgConnection,
    email_filter: Option<&str>,
    from_date: Option<chrono::DateTime<chrono::Utc>>,
    to_date: Option<chrono::DateTime<chrono::Utc>>,
    order_desc: bool,
    limit: i64,
    offset: i64,
  ) -> Result<(Vec<User>, i64), CoreError> {
    let order = if order_desc { "DESC" } else { "ASC" };
    let query = format!(
      r#"SELECT id, email, password_hash, created_at, updated_at FROM users
         WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
           AND ($2::timestamptz IS NULL OR created_at >= $2)
           AND ($3::timestamptz IS NULL OR created_at <= $3)
         ORDER BY created_at {order}
         LIMIT $4 OFFSET $5"#
    );
    let rows = sqlx::query_as::<_, User>(&query)
      .bind(email_filter)
      .bind(from_date)
      .bind(to_date)
      .bind(limit)
      .bind(offset)
      .fetch_all(&mut *conn)
      .await
      .map_err(CoreError::from)?;

    let total: (i64,) = sqlx::query_as(
      r#"SELECT count(*) FROM users
         WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%')
           AND ($2::timestamptz IS NULL OR created_at >= $2)
           AND ($3::timestamptz IS NULL OR created_at <= $3)"#,
    )
    .bind(email_filter)
    .bind(from_date)
    .bind(to_date)
    .fetch_one(conn)
    .await
    .map_err(CoreError::from)?;

    Ok((rows, total.0))
  }
}
