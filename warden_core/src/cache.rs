//! Cache service contract (component A) — the core layer defines the
//! interface, the server layer implements it against Redis, following the
//! dependency-inversion split the teacher uses throughout its
//! `contracts`/`services::infrastructure` boundary.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::CoreError;

#[async_trait]
pub trait Cache: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
  async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), CoreError>;

  /// Deletes every key matching a glob `pattern` (scan-and-delete); a
  /// pattern with no wildcard deletes at most one key.
  async fn delete(&self, pattern: &str) -> Result<u64, CoreError>;

  async fn set_list(&self, key: &str, values: &[String], ttl: Option<u64>) -> Result<(), CoreError>;
  async fn get_list(&self, key: &str) -> Result<Vec<String>, CoreError>;

  /// Removes every occurrence of `value` from the list at `key`.
  async fn discard(&self, key: &str, value: &str) -> Result<(), CoreError>;

  async fn exists(&self, pattern: &str) -> Result<bool, CoreError>;
  async fn keys(&self, pattern: &str) -> Result<Vec<String>, CoreError>;

  async fn increment(&self, key: &str, by: i64) -> Result<i64, CoreError>;
  async fn decrement(&self, key: &str, by: i64) -> Result<i64, CoreError>;

  async fn clear(&self) -> Result<(), CoreError>;
  async fn close(&self) -> Result<(), CoreError>;
}

/// Convenience JSON helpers layered over the raw string API, mirroring the
/// `impl dyn CacheService` ergonomics the teacher adds for its byte-based
/// trait.
pub async fn get_json<T: DeserializeOwned>(
  cache: &dyn Cache,
  key: &str,
) -> Result<Option<T>, CoreError> {
  match cache.get(key).await? {
    Some(raw) => {
      let value = serde_json::from_str(&raw)
        .map_err(|e| CoreError::Validation(format!("json decode error: {e}")))?;
      Ok(Some(value))
    }
    None => Ok(None),
  }
}

pub async fn set_json<T: Serialize + Sync>(
  cache: &dyn Cache,
  key: &str,
  value: &T,
  ttl: Option<u64>,
) -> Result<(), CoreError> {
  let raw = serde_json::to_string(value)
    .map_err(|e| CoreError::Validation(format!("json encode error: {e}")))?;
  cache.set(key, &raw, ttl).await
}
