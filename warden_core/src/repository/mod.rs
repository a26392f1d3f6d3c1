pub mod rbac;
pub mod user;

pub use rbac::{PgRbacRepository, RbacRepository};
pub use user::{PgUserRepository, UserRepository};

use crate::transaction::TransactionManager;

/// Lazily-instantiated typed repository access over a single
/// `TransactionManager` (component G). One gateway per request, built from
/// either the master or the replica pool depending on whether the bus is
/// dispatching a command or a query (§4.G).
pub struct RepositoryGateway {
  pub tx: TransactionManager,
  pub user: Box<dyn UserRepository>,
  pub rbac: Box<dyn RbacRepository>,
}

impl RepositoryGateway {
  pub fn new(tx: TransactionManager) -> Self {
    Self {
      tx,
      user: Box::new(PgUserRepository),
      rbac: Box::new(PgRbacRepository),
    }
  }
}
