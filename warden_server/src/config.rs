//! Environment-sourced configuration, following the teacher's layered
//! `AppConfig` / `ServerConfig` / `AuthConfig` split but loaded directly from
//! environment variables rather than a YAML file, per the prefixes declared
//! in the environment contract (`SERVER_`, `DB_`, `REDIS_`, `SECURITY_`,
//! `APP_`).

use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use warden_core::hasher::Argon2Profile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
  pub server: ServerConfig,
  pub db: DbConfig,
  pub redis: RedisConfig,
  pub security: SecurityConfig,
  pub app: AppEnvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
  pub port: u16,
  /// Worker count; `None` means "auto" (CPU count − 1, minimum 1).
  pub workers: Option<usize>,
  pub request_timeout_ms: u64,
}

impl ServerConfig {
  pub fn resolved_workers(&self) -> usize {
    self
      .workers
      .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2).saturating_sub(1).max(1))
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
  pub master_url: String,
  pub replica_url: String,
  pub max_connections: u32,
  pub min_connections: u32,
  pub pool_overflow: u32,
  /// Not part of the published env contract by name, but needed by the
  /// concurrency-cap formula in §9.1; defaults to `max_connections` when the
  /// replica pool is sized the same as master.
  pub replica_max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
  pub url: String,
  pub pool_size: u32,
  pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
  pub jwt_private_key_pem: String,
  pub jwt_public_key_pem: String,
  pub jwt_issuer: Option<String>,
  pub jwt_audience: Option<String>,
  pub access_token_ttl_secs: i64,
  pub refresh_token_ttl_secs: i64,
  pub argon2_profile: Argon2Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppEnv {
  Dev,
  Staging,
  Prod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEnvConfig {
  pub env: AppEnv,
  pub log_level: String,
}

impl AppConfig {
  /// Loads configuration from the process environment, optionally reading a
  /// `.env` file first (a no-op in production where the file is absent).
  pub fn from_env() -> Result<Self> {
    dotenv::dotenv().ok();

    Ok(Self {
      server: ServerConfig {
        port: env_parse("SERVER_PORT", 8080)?,
        workers: match env::var("SERVER_WORKERS").ok().as_deref() {
          None | Some("auto") => None,
          Some(n) => Some(n.parse().context("SERVER_WORKERS must be a number or \"auto\"")?),
        },
        request_timeout_ms: env_parse("SERVER_REQUEST_TIMEOUT_MS", 30_000)?,
      },
      db: DbConfig {
        master_url: env_required("DB_MASTER_URL")?,
        replica_url: env::var("DB_REPLICA_URL").ok().unwrap_or_else(|| env::var("DB_MASTER_URL").unwrap_or_default()),
        max_connections: env_parse("DB_MAX_CONNECTIONS", 10)?,
        min_connections: env_parse("DB_MIN_CONNECTIONS", 1)?,
        pool_overflow: env_parse("DB_POOL_OVERFLOW", 5)?,
        replica_max_connections: env_parse("DB_REPLICA_MAX_CONNECTIONS", 10)?,
      },
      redis: RedisConfig {
        url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        pool_size: env_parse("REDIS_POOL_SIZE", 10)?,
        key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or_default(),
      },
      security: SecurityConfig {
        jwt_private_key_pem: env_required("SECURITY_JWT_PRIVATE_KEY_PEM")?,
        jwt_public_key_pem: env_required("SECURITY_JWT_PUBLIC_KEY_PEM")?,
        jwt_issuer: env::var("SECURITY_JWT_ISSUER").ok(),
        jwt_audience: env::var("SECURITY_JWT_AUDIENCE").ok(),
        access_token_ttl_secs: env_parse("SECURITY_ACCESS_TOKEN_TTL_SECS", 900)?,
        refresh_token_ttl_secs: env_parse("SECURITY_REFRESH_TOKEN_TTL_SECS", 1_209_600)?,
        argon2_profile: match env::var("SECURITY_ARGON2_PROFILE").as_deref() {
          Ok("high_memory") => Argon2Profile::HighMemory,
          _ => Argon2Profile::LowMemory,
        },
      },
      app: AppEnvConfig {
        env: match env::var("APP_ENV").as_deref() {
          Ok("staging") => AppEnv::Staging,
          Ok("prod") => AppEnv::Prod,
          _ => AppEnv::Dev,
        },
        log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".into()),
      },
    })
  }
}

fn env_required(key: &str) -> Result<String> {
  env::var(key).map_err(|_| anyhow!("missing required environment variable {key}"))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
  T::Err: std::fmt::Display,
{
  match env::var(key) {
    Ok(v) => v.parse().map_err(|e| anyhow!("invalid value for {key}: {e}")),
    Err(_) => Ok(default),
  }
}
