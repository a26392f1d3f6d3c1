//! Shared accessor traits implemented by the server's application state, so
//! core-layer code can be generic over "anything that carries a master/
//! replica pool pair" without depending on the concrete state struct.

use sqlx::PgPool;

pub trait WithDbPool {
  /// The pool mutating commands run against.
  fn master_pool(&self) -> &PgPool;
  /// The pool read-only queries run against.
  fn replica_pool(&self) -> &PgPool;
}

impl WithDbPool for (PgPool, PgPool) {
  fn master_pool(&self) -> &PgPool {
    &self.0
  }

  fn replica_pool(&self) -> &PgPool {
    &self.1
  }
}
