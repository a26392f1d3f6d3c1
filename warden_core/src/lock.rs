//! Named distributed mutual exclusion over the cache (component B).
//!
//! Used both to serialize refresh-token rotation per user (§4.E) and to
//! throttle the permission-catalog bootstrapper across worker processes
//! (§4.I). Acquisition blocks up to `2 * timeout`; the holder's lease is
//! `timeout` — a crashed holder's lock simply expires.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::CoreError;

#[async_trait]
pub trait SharedLock: Send + Sync {
  async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool, CoreError>;
  async fn release(&self, name: &str) -> Result<(), CoreError>;
  async fn locked(&self, name: &str) -> Result<bool, CoreError>;
}

/// RAII guard released on drop (best-effort — callers that need to observe
/// release failures should call `release` directly and `std::mem::forget`
/// the guard). Mirrors the source's `async with lock(...)` scope-exit
/// guarantee (§4.B, invariant 9).
pub struct LockGuard<'a> {
  lock: &'a dyn SharedLock,
  name: String,
  released: bool,
}

impl<'a> LockGuard<'a> {
  pub fn new(lock: &'a dyn SharedLock, name: String) -> Self {
    Self {
      lock,
      name,
      released: false,
    }
  }

  pub async fn release(mut self) -> Result<(), CoreError> {
    self.released = true;
    self.lock.release(&self.name).await
  }
}

impl Drop for LockGuard<'_> {
  fn drop(&mut self) {
    if !self.released {
      tracing::warn!(lock = %self.name, "lock guard dropped without explicit release");
    }
  }
}

/// Acquires `name` within `2 * timeout`, yielding a guard that releases the
/// lock when dropped or explicitly released.
pub async fn with_lock<'a>(
  lock: &'a dyn SharedLock,
  name: &str,
  timeout: Duration,
) -> Result<LockGuard<'a>, CoreError> {
  let deadline = tokio::time::Instant::now() + timeout * 2;
  loop {
    if lock.acquire(name, timeout).await? {
      return Ok(LockGuard::new(lock, name.to_string()));
    }
    if tokio::time::Instant::now() >= deadline {
      return Err(CoreError::LockTimeout(format!(
        "timed out acquiring lock {name}"
      )));
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
  }
}
