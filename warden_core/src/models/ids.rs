//! Newtype wrappers for the domain's primary keys.
//!
//! These give type safety across repository signatures so a `RoleId`
//! can never be passed where a `UserId` is expected.

use serde::{Deserialize, Serialize};
use sqlx::Type;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! uuid_id {
  ($name:ident) => {
    #[derive(
      Debug,
      Clone,
      Copy,
      PartialEq,
      Eq,
      PartialOrd,
      Ord,
      Hash,
      Serialize,
      Deserialize,
      Type,
      ToSchema,
    )]
    #[sqlx(transparent)]
    #[serde(transparent)]
    pub struct $name(pub Uuid);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl $name {
      pub fn new() -> Self {
        Self(Uuid::new_v4())
      }

      /// Lowercase hex without dashes, the form used as the cache key
      /// segment (`auth:{user_hex}`, `auth:lock:{user_hex}`).
      pub fn as_hex(&self) -> String {
        self.0.simple().to_string()
      }
    }

    impl Default for $name {
      fn default() -> Self {
        Self::new()
      }
    }

    impl From<Uuid> for $name {
      fn from(id: Uuid) -> Self {
        Self(id)
      }
    }
  };
}

uuid_id!(UserId);
uuid_id!(RoleId);
uuid_id!(PermissionId);
uuid_id!(PermissionFieldId);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn as_hex_has_no_dashes() {
    let id = UserId::new();
    assert!(!id.as_hex().contains('-'));
    assert_eq!(id.as_hex().len(), 32);
  }
}
