//! Redis-backed `SharedLock`: `SET NX PX` to acquire, a value check before
//! `DEL` to release (so a holder never deletes a lease it no longer owns).

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use warden_core::error::CoreError;

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
  return redis.call("del", KEYS[1])
else
  return 0
end
"#;

pub struct RedisLock {
  conn: RwLock<MultiplexedConnection>,
  prefix: String,
  /// Per-process token so `release` only removes a lease this process holds.
  token: String,
}

impl RedisLock {
  pub async fn connect(url: &str, prefix: &str) -> Result<Self, CoreError> {
    let client = Client::open(url).map_err(CoreError::from)?;
    let conn = client
      .get_multiplexed_async_connection()
      .await
      .map_err(CoreError::from)?;
    Ok(Self {
      conn: RwLock::new(conn),
      prefix: prefix.to_string(),
      token: Uuid::new_v4().to_string(),
    })
  }

  fn full_key(&self, name: &str) -> String {
    if self.prefix.is_empty() {
      name.to_string()
    } else {
      format!("{}:{}", self.prefix, name)
    }
  }
}

#[async_trait]
impl warden_core::lock::SharedLock for RedisLock {
  async fn acquire(&self, name: &str, timeout: Duration) -> Result<bool, CoreError> {
    let mut conn = self.conn.write().await;
    let acquired: Option<String> = redis::cmd("SET")
      .arg(self.full_key(name))
      .arg(&self.token)
      .arg("NX")
      .arg("PX")
      .arg(timeout.as_millis() as i64)
      .query_async(&mut *conn)
      .await?;
    Ok(acquired.is_some())
  }

  async fn release(&self, name: &str) -> Result<(), CoreError> {
    let mut conn = self.conn.write().await;
    redis::Script::new(RELEASE_SCRIPT)
      .key(self.full_key(name))
      .arg(&self.token)
      .invoke_async::<i64>(&mut *conn)
      .await?;
    Ok(())
  }

  async fn locked(&self, name: &str) -> Result<bool, CoreError> {
    let mut conn = self.conn.write().await;
    let exists: bool = conn.exists(self.full_key(name)).await?;
    Ok(exists)
  }
}
