//! Session registry and refresh-token rotation (component E).
//!
//! A session is identified by `(user, jti)` and bound to a client-supplied
//! `fingerprint`. Entries live only in the cache as
//! `jti:sha256(fingerprint:refresh_token)` under `auth:{user_hex}`; there is
//! no database-backed session table (§3's session-state paragraph).

use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::cache::Cache;
use crate::error::CoreError;
use crate::jwt::{JwtKeys, TokenPair, TokenType};
use crate::lock::{with_lock, SharedLock};

const ROTATION_LOCK_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RefreshStore<'a> {
  cache: &'a dyn Cache,
  lock: &'a dyn SharedLock,
  jwt: &'a JwtKeys,
  access_ttl_secs: i64,
  refresh_ttl_secs: i64,
}

fn session_list_key(user_hex: &str) -> String {
  format!("auth:{user_hex}")
}

fn rotation_lock_name(user_hex: &str) -> String {
  format!("auth:lock:{user_hex}")
}

fn session_entry(jti: &str, fingerprint: &str, refresh_token: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(format!("{fingerprint}:{refresh_token}"));
  format!("{jti}:{}", hex::encode(hasher.finalize()))
}

impl<'a> RefreshStore<'a> {
  pub fn new(
    cache: &'a dyn Cache,
    lock: &'a dyn SharedLock,
    jwt: &'a JwtKeys,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
  ) -> Self {
    Self {
      cache,
      lock,
      jwt,
      access_ttl_secs,
      refresh_ttl_secs,
    }
  }

  /// Issues a fresh session for `user_hex`, additive with any existing
  /// sessions for the same user (invariant 8).
  pub async fn make_token(
    &self,
    user_hex: &str,
    fingerprint: &str,
  ) -> Result<TokenPair, CoreError> {
    let jti = Uuid::new_v4().to_string();
    let pair =
      self
        .jwt
        .issue_pair(user_hex, self.access_ttl_secs, self.refresh_ttl_secs, &jti, None)?;
    let entry = session_entry(&jti, fingerprint, &pair.refresh_token);
    self.push_session(user_hex, &entry).await?;
    Ok(pair)
  }

  /// Verifies, then rotates, a refresh token. On replay (the computed entry
  /// is absent from the user's session list) the *entire* list is purged —
  /// conservative compromise handling (§4.E, invariant 6).
  pub async fn rotate(
    &self,
    fingerprint: &str,
    refresh_token: &str,
  ) -> Result<TokenPair, CoreError> {
    let claims = self.jwt.verify(refresh_token, TokenType::Refresh)?;
    let user_hex = claims.sub;
    let guard = with_lock(self.lock, &rotation_lock_name(&user_hex), ROTATION_LOCK_TIMEOUT).await?;

    let list_key = session_list_key(&user_hex);
    let list = self.cache.get_list(&list_key).await?;
    let jti = claims.jti.clone().unwrap_or_default();
    let entry = session_entry(&jti, fingerprint, refresh_token);

    if !list.iter().any(|e| e == &entry) {
      self.cache.delete(&list_key).await?;
      guard.release().await?;
      return Err(CoreError::InvalidToken(
        "refresh token reuse detected; session revoked".into(),
      ));
    }

    self.cache.discard(&list_key, &entry).await?;
    let new_pair = self.jwt.issue_pair(
      &user_hex,
      self.access_ttl_secs,
      self.refresh_ttl_secs,
      &jti,
      None,
    )?;
    let new_entry = session_entry(&jti, fingerprint, &new_pair.refresh_token);
    self.push_session(&user_hex, &new_entry).await?;

    guard.release().await?;
    Ok(new_pair)
  }

  /// Revokes a single session; idempotent (invariant 7) — a second call
  /// with the same token returns `false`.
  pub async fn revoke(&self, fingerprint: &str, refresh_token: &str) -> Result<bool, CoreError> {
    let claims = self.jwt.verify(refresh_token, TokenType::Refresh)?;
    let user_hex = claims.sub;
    let jti = claims.jti.unwrap_or_default();
    let entry = session_entry(&jti, fingerprint, refresh_token);

    let list_key = session_list_key(&user_hex);
    let list = self.cache.get_list(&list_key).await?;
    if !list.iter().any(|e| e == &entry) {
      return Ok(false);
    }
    self.cache.discard(&list_key, &entry).await?;
    Ok(true)
  }

  async fn push_session(&self, user_hex: &str, entry: &str) -> Result<(), CoreError> {
    let list_key = session_list_key(user_hex);
    let mut list = self.cache.get_list(&list_key).await?;
    list.push(entry.to_string());
    self
      .cache
      .set_list(&list_key, &list, Some(self.refresh_ttl_secs as u64))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn session_entry_is_deterministic_for_same_inputs() {
    let a = session_entry("jti-1", "fp", "token");
    let b = session_entry("jti-1", "fp", "token");
    assert_eq!(a, b);
  }

  #[test]
  fn session_entry_differs_on_fingerprint() {
    let a = session_entry("jti-1", "fp-a", "token");
    let b = session_entry("jti-1", "fp-b", "token");
    assert_ne!(a, b);
  }
}
