//! Redis-backed implementation of the core `Cache` trait, grounded in the
//! teacher's `RedisCacheService` (a prefixed, multiplexed-connection wrapper
//! over the `redis` crate).

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::RwLock;

use warden_core::error::CoreError;

pub struct RedisCache {
  conn: RwLock<MultiplexedConnection>,
  prefix: String,
}

impl RedisCache {
  pub async fn connect(url: &str, prefix: &str) -> Result<Self, CoreError> {
    let client = Client::open(url).map_err(CoreError::from)?;
    let conn = client
      .get_multiplexed_async_connection()
      .await
      .map_err(CoreError::from)?;
    Ok(Self {
      conn: RwLock::new(conn),
      prefix: prefix.to_string(),
    })
  }

  fn full_key(&self, key: &str) -> String {
    if self.prefix.is_empty() {
      key.to_string()
    } else {
      format!("{}:{}", self.prefix, key)
    }
  }
}

#[async_trait]
impl warden_core::cache::Cache for RedisCache {
  async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
    let mut conn = self.conn.write().await;
    let value: Option<String> = conn.get(self.full_key(key)).await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CoreError> {
    let mut conn = self.conn.write().await;
    let full_key = self.full_key(key);
    match ttl {
      Some(secs) => conn.set_ex::<_, _, ()>(full_key, value, secs).await?,
      None => conn.set::<_, _, ()>(full_key, value).await?,
    }
    Ok(())
  }

  async fn delete(&self, pattern: &str) -> Result<u64, CoreError> {
    let mut conn = self.conn.write().await;
    if !pattern.contains('*') && !pattern.contains('?') {
      let deleted: u64 = conn.del(self.full_key(pattern)).await?;
      return Ok(deleted);
    }
    let full_pattern = self.full_key(pattern);
    let keys: Vec<String> = conn.scan_match(&full_pattern).await?.collect::<Vec<_>>().await;
    if keys.is_empty() {
      return Ok(0);
    }
    let deleted: u64 = conn.del(keys).await?;
    Ok(deleted)
  }

  async fn set_list(&self, key: &str, values: &[String], ttl: Option<u64>) -> Result<(), CoreError> {
    let mut conn = self.conn.write().await;
    let full_key = self.full_key(key);
    let mut pipe = redis::pipe();
    pipe.del(&full_key).ignore();
    if !values.is_empty() {
      pipe.rpush(&full_key, values).ignore();
    }
    if let Some(secs) = ttl {
      pipe.expire(&full_key, secs as i64).ignore();
    }
    pipe.query_async::<()>(&mut *conn).await?;
    Ok(())
  }

  async fn get_list(&self, key: &str) -> Result<Vec<String>, CoreError> {
    let mut conn = self.conn.write().await;
    let values: Vec<String> = conn.lrange(self.full_key(key), 0, -1).await?;
    Ok(values)
  }

  async fn discard(&self, key: &str, value: &str) -> Result<(), CoreError> {
    let mut conn = self.conn.write().await;
    conn
      .lrem::<_, _, ()>(self.full_key(key), 0, value)
      .await?;
    Ok(())
  }

  async fn exists(&self, pattern: &str) -> Result<bool, CoreError> {
    let mut conn = self.conn.write().await;
    if !pattern.contains('*') && !pattern.contains('?') {
      let exists: bool = conn.exists(self.full_key(pattern)).await?;
      return Ok(exists);
    }
    let full_pattern = self.full_key(pattern);
    let mut iter = conn.scan_match::<_, String>(&full_pattern).await?;
    Ok(iter.next().await.is_some())
  }

  async fn keys(&self, pattern: &str) -> Result<Vec<String>, CoreError> {
    let mut conn = self.conn.write().await;
    let full_pattern = self.full_key(pattern);
    let keys: Vec<String> = conn.scan_match(&full_pattern).await?.collect::<Vec<_>>().await;
    let stripped_prefix_len = if self.prefix.is_empty() { 0 } else { self.prefix.len() + 1 };
    Ok(keys.into_iter().map(|k| k[stripped_prefix_len..].to_string()).collect())
  }

  async fn increment(&self, key: &str, by: i64) -> Result<i64, CoreError> {
    let mut conn = self.conn.write().await;
    let value: i64 = conn.incr(self.full_key(key), by).await?;
    Ok(value)
  }

  async fn decrement(&self, key: &str, by: i64) -> Result<i64, CoreError> {
    let mut conn = self.conn.write().await;
    let value: i64 = conn.decr(self.full_key(key), by).await?;
    Ok(value)
  }

  async fn clear(&self) -> Result<(), CoreError> {
    self.delete("*").await?;
    Ok(())
  }

  async fn close(&self) -> Result<(), CoreError> {
    Ok(())
  }
}
