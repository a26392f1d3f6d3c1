//! Shared application state: connection pools, cache/lock clients, key
//! material, and the route-rule table the auth middleware consults.
//!
//! Mirrors the teacher's `AppState(Arc<AppStateInner>)` split — state is
//! cheap to clone and shared across every request via axum's `State`
//! extractor.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use warden_core::bus::Bus;
use warden_core::cache::Cache;
use warden_core::container::Container;
use warden_core::hasher::Hasher;
use warden_core::jwt::JwtKeys;
use warden_core::lock::SharedLock;
use warden_core::route_rule::RouteRule;
use warden_core::state::WithDbPool;

use crate::config::AppConfig;
use crate::infra::cache::RedisCache;
use crate::infra::lock::RedisLock;
use crate::routes::route_rules;

#[derive(Clone)]
pub struct AppState {
  inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
  pub config: AppConfig,
  pub master_pool: PgPool,
  pub replica_pool: PgPool,
  pub cache: Arc<dyn Cache>,
  pub lock: Arc<dyn SharedLock>,
  pub jwt: JwtKeys,
  pub hasher: Hasher,
  pub container: Container,
  pub bus: Bus,
  /// Keyed by `"{METHOD} {axum-matched-path}"`, e.g. `"GET /private/users/{user_id}"`.
  pub route_rules: HashMap<String, RouteRule>,
}

impl AppState {
  pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
    let master_pool = PgPoolOptions::new()
      .max_connections(config.db.max_connections)
      .min_connections(config.db.min_connections)
      .connect(&config.db.master_url)
      .await?;
    let replica_pool = PgPoolOptions::new()
      .max_connections(config.db.replica_max_connections)
      .min_connections(config.db.min_connections)
      .connect(&config.db.replica_url)
      .await?;

    let cache = Arc::new(RedisCache::connect(&config.redis.url, &config.redis.key_prefix).await?);
    let lock = Arc::new(RedisLock::connect(&config.redis.url, &config.redis.key_prefix).await?);

    let jwt = JwtKeys::from_pem(
      &config.security.jwt_private_key_pem,
      &config.security.jwt_public_key_pem,
      config.security.jwt_issuer.clone(),
      config.security.jwt_audience.clone(),
      5,
    )?;
    let hasher = Hasher::new(config.security.argon2_profile);

    let route_rules = route_rules();

    let inner = AppStateInner {
      config,
      master_pool,
      replica_pool,
      cache,
      lock,
      jwt,
      hasher,
      container: Container::new(),
      bus: Bus::new(),
      route_rules,
    };
    Ok(Self { inner: Arc::new(inner) })
  }

  pub fn config(&self) -> &AppConfig {
    &self.inner.config
  }

  pub fn master_pool(&self) -> &PgPool {
    &self.inner.master_pool
  }

  pub fn replica_pool(&self) -> &PgPool {
    &self.inner.replica_pool
  }

  pub fn cache(&self) -> &dyn Cache {
    self.inner.cache.as_ref()
  }

  pub fn lock(&self) -> &dyn SharedLock {
    self.inner.lock.as_ref()
  }

  pub fn jwt(&self) -> &JwtKeys {
    &self.inner.jwt
  }

  pub fn hasher(&self) -> &Hasher {
    &self.inner.hasher
  }

  pub fn container(&self) -> &Container {
    &self.inner.container
  }

  pub fn bus(&self) -> &Bus {
    &self.inner.bus
  }

  pub fn route_rule(&self, method: &str, matched_path: &str) -> Option<&RouteRule> {
    self.inner.route_rules.get(&format!("{method} {matched_path}"))
  }
}

impl WithDbPool for AppState {
  fn master_pool(&self) -> &PgPool {
    &self.inner.master_pool
  }

  fn replica_pool(&self) -> &PgPool {
    &self.inner.replica_pool
  }
}
