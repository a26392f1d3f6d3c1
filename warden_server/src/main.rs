//! Warden server entry point: loads configuration, runs migrations,
//! bootstraps the permission catalog, and serves the HTTP API.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use warden_core::bootstrap::bootstrap_permission_catalog;
use warden_core::repository::PgRbacRepository;
use warden_core::transaction::TransactionManager;

use warden_server::{get_router, route_rules, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = AppConfig::from_env()?;

  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(tracing_subscriber::EnvFilter::new(&config.app.log_level))
    .init();

  let state = AppState::new(config).await?;

  warden_server::migration::run_migrations(state.master_pool()).await?;

  let rules: Vec<_> = route_rules().into_values().collect();
  let mut tx = TransactionManager::new(state.master_pool().clone());
  bootstrap_permission_catalog(state.cache(), state.lock(), &PgRbacRepository, &mut tx, &rules).await?;

  let app = get_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], state.config().server.port));
  info!("warden_server listening on {addr}");

  let listener = TcpListener::bind(addr).await?;
  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

  Ok(())
}
