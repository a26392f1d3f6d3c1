//! Idempotent, lock-guarded permission-catalog bootstrapper (component I).
//!
//! Runs once per deploy rollout, across however many worker processes start
//! concurrently: the shared lock gives correctness, the cache flag gives
//! throughput (no thundering herd of identical idempotent upserts).

use std::time::Duration;

use crate::cache::Cache;
use crate::error::CoreError;
use crate::lock::{with_lock, SharedLock};
use crate::repository::RbacRepository;
use crate::route_rule::RouteRule;
use crate::transaction::TransactionManager;

const BOOTSTRAP_LOCK_NAME: &str = "bootstrap";
const BOOTSTRAP_LOCK_TIMEOUT: Duration = Duration::from_secs(20);
const BOOTSTRAP_MARKER_KEY: &str = "create_rules";
const BOOTSTRAP_MARKER_TTL_SECS: u64 = 30;

pub async fn bootstrap_permission_catalog(
  cache: &dyn Cache,
  lock: &dyn SharedLock,
  rbac: &dyn RbacRepository,
  tx: &mut TransactionManager,
  rules: &[RouteRule],
) -> Result<(), CoreError> {
  let guard = with_lock(lock, BOOTSTRAP_LOCK_NAME, BOOTSTRAP_LOCK_TIMEOUT).await?;

  if cache.get(BOOTSTRAP_MARKER_KEY).await?.is_some() {
    tracing::debug!("permission catalog already bootstrapped by another worker; skipping");
    guard.release().await?;
    return Ok(());
  }
  cache
    .set(BOOTSTRAP_MARKER_KEY, "1", Some(BOOTSTRAP_MARKER_TTL_SECS))
    .await?;

  let conn = tx.with_transaction(None, false).await?;
  for rule in rules {
    let spec = &rule.permission;
    let permission = rbac
      .upsert_permission(
        conn,
        &spec.resource,
        spec.action,
        &spec.operation,
        spec.description.as_deref(),
      )
      .await?;
    rbac
      .upsert_permission_fields(conn, permission.id, &spec.fields)
      .await?;
    tracing::info!(permission = %spec.key(), "registered permission in catalog");
  }
  tx.commit().await?;

  guard.release().await?;
  Ok(())
}
