//! A two-channel return type for domain boundaries, replacing ad-hoc
//! exception propagation with explicit success/failure combinators.
//!
//! This mirrors `std::result::Result` in shape but is kept as a distinct
//! type so repositories, the authenticator, and the bus can standardize on
//! one set of combinators (`map`, `map_err`, `and_then`, `unwrap_or_raise`,
//! ...) regardless of which concrete error type they carry, and so that
//! `unwrap_or_raise` can attach a replacement error without the caller
//! having to match on the original.

use crate::error::CoreError;

#[derive(Debug, Clone)]
#[must_use = "an AppResult may carry a failure that must be handled"]
pub enum AppResult<T, E = CoreError> {
  Ok(T),
  Err(E),
}

pub use AppResult::Err as ResultErr;
pub use AppResult::Ok as ResultOk;

impl<T, E> AppResult<T, E> {
  pub fn ok(value: T) -> Self {
    AppResult::Ok(value)
  }

  pub fn err(error: E) -> Self {
    AppResult::Err(error)
  }

  pub fn is_ok(&self) -> bool {
    matches!(self, AppResult::Ok(_))
  }

  pub fn is_err(&self) -> bool {
    matches!(self, AppResult::Err(_))
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AppResult<U, E> {
    match self {
      AppResult::Ok(v) => AppResult::Ok(f(v)),
      AppResult::Err(e) => AppResult::Err(e),
    }
  }

  pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> AppResult<T, F> {
    match self {
      AppResult::Ok(v) => AppResult::Ok(v),
      AppResult::Err(e) => AppResult::Err(f(e)),
    }
  }

  pub fn and_then<U>(self, f: impl FnOnce(T) -> AppResult<U, E>) -> AppResult<U, E> {
    match self {
      AppResult::Ok(v) => f(v),
      AppResult::Err(e) => AppResult::Err(e),
    }
  }

  /// Returns the value, or `default` on `Err`.
  pub fn unwrap_or(self, default: T) -> T {
    match self {
      AppResult::Ok(v) => v,
      AppResult::Err(_) => default,
    }
  }

  pub fn unwrap_or_else(self, f: impl FnOnce(E) -> T) -> T {
    match self {
      AppResult::Ok(v) => v,
      AppResult::Err(e) => f(e),
    }
  }

  /// Returns the value, or raises (panics with) the given error in its
  /// place. Named to match the source's `unwrap_or_raise`; it never
  /// manufactures a `T` out of an `Err` — it always either returns the real
  /// value or propagates a failure.
  pub fn unwrap_or_raise<F: Into<anyhow::Error>>(self, raise: impl FnOnce(E) -> F) -> T
  where
    T: std::fmt::Debug,
  {
    match self {
      AppResult::Ok(v) => v,
      AppResult::Err(e) => panic!("unwrap_or_raise: {:?}", raise(e).into()),
    }
  }

  pub fn unwrap(self) -> T
  where
    E: std::fmt::Debug,
  {
    match self {
      AppResult::Ok(v) => v,
      AppResult::Err(e) => panic!("called `AppResult::unwrap` on an `Err` value: {:?}", e),
    }
  }

  pub fn as_std(self) -> Result<T, E> {
    self.into()
  }
}

impl<T, E> From<Result<T, E>> for AppResult<T, E> {
  fn from(r: Result<T, E>) -> Self {
    match r {
      Ok(v) => AppResult::Ok(v),
      Err(e) => AppResult::Err(e),
    }
  }
}

impl<T, E> From<AppResult<T, E>> for Result<T, E> {
  fn from(r: AppResult<T, E>) -> Self {
    match r {
      AppResult::Ok(v) => Ok(v),
      AppResult::Err(e) => Err(e),
    }
  }
}

/// Adapts a fallible closure into one that returns `AppResult`, normalizing
/// any unexpected error into `CoreError::Internal` the way `as_result` in
/// the original wraps native exceptions. Sync form; the async call sites in
/// this crate just `.await` their own `AppResult`-returning futures directly.
pub fn as_result<T>(f: impl FnOnce() -> Result<T, CoreError>) -> AppResult<T, CoreError> {
  f().into()
}

pub type Result<T, E = CoreError> = AppResult<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn map_and_and_then_chain() {
    let r: AppResult<i32> = AppResult::Ok(2);
    let r = r.map(|v| v * 3).and_then(|v| AppResult::Ok(v + 1));
    assert!(r.is_ok());
    assert_eq!(r.unwrap_or(0), 7);
  }

  #[test]
  fn unwrap_or_returns_default_on_err() {
    let r: AppResult<i32> = AppResult::Err(CoreError::NotFound("x".into()));
    assert_eq!(r.unwrap_or(-1), -1);
  }

  #[test]
  fn map_err_transforms_error_channel() {
    let r: AppResult<i32> = AppResult::Err(CoreError::NotFound("x".into()));
    let r = r.map_err(|e| format!("wrapped: {e}"));
    match r {
      AppResult::Err(s) => assert!(s.starts_with("wrapped:")),
      AppResult::Ok(_) => panic!("expected Err"),
    }
  }
}
