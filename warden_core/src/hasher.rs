//! Password hashing (component C), adapted from the teacher's
//! `domains/user/password.rs`: an Argon2 memory-hard KDF, with a profile
//! switch between a low-memory and a high-memory parameter set.

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
  Argon2, Params, PasswordHash, PasswordVerifier,
};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argon2Profile {
  LowMemory,
  HighMemory,
}

impl Argon2Profile {
  fn params(self) -> Params {
    match self {
      // 19 MiB, 2 iterations — RFC 9106's low-memory recommendation.
      Argon2Profile::LowMemory => Params::new(19_456, 2, 1, None).expect("valid argon2 params"),
      // 64 MiB, 3 iterations — RFC 9106's higher-memory recommendation.
      Argon2Profile::HighMemory => Params::new(65_536, 3, 4, None).expect("valid argon2 params"),
    }
  }
}

pub struct Hasher {
  argon2: Argon2<'static>,
}

impl Hasher {
  pub fn new(profile: Argon2Profile) -> Self {
    Self {
      argon2: Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        profile.params(),
      ),
    }
  }

  pub fn hash(&self, plain: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(OsRng);
    let hash = self
      .argon2
      .hash_password(plain.as_bytes(), &salt)
      .map_err(|e| CoreError::Internal(e.to_string()))?
      .to_string();
    Ok(hash)
  }

  /// Never raises on mismatch or on a structurally invalid hash — both
  /// collapse to `false` so callers can treat them as "invalid
  /// credentials" uniformly (§4.C).
  pub fn verify(&self, plain: &str, hashed: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
      return false;
    };
    self
      .argon2
      .verify_password(plain.as_bytes(), &parsed)
      .is_ok()
  }
}

impl Default for Hasher {
  fn default() -> Self {
    Self::new(Argon2Profile::LowMemory)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify_round_trips() {
    let h = Hasher::default();
    let hash = h.hash("correct horse battery staple").unwrap();
    assert!(h.verify("correct horse battery staple", &hash));
    assert!(!h.verify("wrong password", &hash));
  }

  #[test]
  fn verify_returns_false_on_garbage_hash() {
    let h = Hasher::default();
    assert!(!h.verify("anything", "not-a-hash"));
  }
}
