//! Unit-of-work over a single Postgres connection (component F).
//!
//! A `TransactionManager` is acquired per request from either the master or
//! the replica pool (the bus picks which, per §4.M/§4.G) and owns exactly
//! one outer transaction; nested calls open a `SAVEPOINT` instead of a new
//! `BEGIN`, matching sqlx's `Transaction` which rolls back on `Drop` if it
//! was never committed.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
  ReadCommitted,
  RepeatableRead,
  Serializable,
}

impl IsolationLevel {
  fn as_sql(self) -> &'static str {
    match self {
      IsolationLevel::ReadCommitted => "READ COMMITTED",
      IsolationLevel::RepeatableRead => "REPEATABLE READ",
      IsolationLevel::Serializable => "SERIALIZABLE",
    }
  }
}

/// Owns at most one root transaction on the underlying connection. Opening
/// a `TransactionManager` does not start a transaction by itself — the
/// first call to `with_transaction` does.
pub struct TransactionManager {
  pool: PgPool,
  tx: Option<Transaction<'static, Postgres>>,
  savepoints: Vec<String>,
}

impl TransactionManager {
  pub fn new(pool: PgPool) -> Self {
    Self {
      pool,
      tx: None,
      savepoints: Vec::new(),
    }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  pub fn has_active_transaction(&self) -> bool {
    self.tx.is_some()
  }

  /// Enters (or deepens) a unit of work.
  ///
  /// - No active transaction, `nested=false`: `BEGIN [ISOLATION LEVEL ...]`.
  /// - No active transaction, `nested=true`: a savepoint was requested with
  ///   nothing to nest inside; warns and begins a regular transaction,
  ///   matching the source's tolerant behavior.
  /// - Active transaction, `nested=true`: opens `SAVEPOINT sp_{n}`;
  ///   specifying an isolation level here is rejected — isolation can only
  ///   be set for the outermost transaction.
  /// - Active transaction, `nested=false`: reused as-is (the same manager
  ///   may issue many statements against one outer transaction).
  pub async fn with_transaction(
    &mut self,
    isolation: Option<IsolationLevel>,
    nested: bool,
  ) -> Result<&mut sqlx::PgConnection, CoreError> {
    if self.tx.is_none() {
      if nested {
        tracing::warn!("with_transaction(nested=true) called with no active transaction; beginning a regular transaction");
      }
      let mut tx = self.pool.begin().await.map_err(CoreError::from)?;
      if let Some(level) = isolation {
        sqlx::query(&format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql()))
          .execute(&mut *tx)
          .await
          .map_err(CoreError::from)?;
      }
      self.tx = Some(tx);
    } else if nested {
      if isolation.is_some() {
        return Err(CoreError::Validation(
          "isolation level cannot be set on a nested transaction".into(),
        ));
      }
      let name = format!("sp_{}", self.savepoints.len());
      let tx = self.tx.as_mut().expect("checked above");
      sqlx::query(&format!("SAVEPOINT {name}"))
        .execute(&mut **tx)
        .await
        .map_err(CoreError::from)?;
      self.savepoints.push(name);
    }
    Ok(self.tx.as_mut().expect("transaction just ensured"))
  }

  /// Runs a query builder against the currently active connection.
  pub async fn send(
    &mut self,
    query: sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments>,
  ) -> Result<sqlx::postgres::PgQueryResult, CoreError> {
    let conn = self.with_transaction(None, false).await?;
    query.execute(conn).await.map_err(CoreError::from)
  }

  /// Releases the innermost savepoint, or commits the outer transaction
  /// when no savepoints remain.
  pub async fn commit(&mut self) -> Result<(), CoreError> {
    if let Some(name) = self.savepoints.pop() {
      let tx = self.tx.as_mut().expect("savepoint implies active tx");
      sqlx::query(&format!("RELEASE SAVEPOINT {name}"))
        .execute(&mut **tx)
        .await
        .map_err(CoreError::from)?;
      return Ok(());
    }
    if let Some(tx) = self.tx.take() {
      tx.commit().await.map_err(CoreError::from)?;
    }
    Ok(())
  }

  /// Rolls back to the innermost savepoint, or aborts the whole transaction.
  pub async fn rollback(&mut self) -> Result<(), CoreError> {
    if let Some(name) = self.savepoints.pop() {
      let tx = self.tx.as_mut().expect("savepoint implies active tx");
      sqlx::query(&format!("ROLLBACK TO SAVEPOINT {name}"))
        .execute(&mut **tx)
        .await
        .map_err(CoreError::from)?;
      return Ok(());
    }
    if let Some(tx) = self.tx.take() {
      tx.rollback().await.map_err(CoreError::from)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn isolation_sql_is_standard() {
    assert_eq!(IsolationLevel::Serializable.as_sql(), "SERIALIZABLE");
  }
}
