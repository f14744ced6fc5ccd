mod auth;
mod entity;
mod error;
mod notify;
mod plugins;
mod prelude;
mod state;
mod sv;
mod utils;

use std::env;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  notify::Notifier,
  prelude::*,
  state::{AppState, Config, FixedAdminList},
};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "parrainage=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:parrainage.db?mode=rwc".into());
  let secret = env::var("SERVER_SECRET").expect("SERVER_SECRET not set");

  let acl = FixedAdminList::from_env();
  if acl.is_empty() {
    warn!("No admins configured, admin endpoints are unreachable");
  }

  info!("Starting referral server v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(
    AppState::new(
      &db_url,
      Arc::new(acl),
      secret,
      Config::from_env(),
      Notifier::from_env(),
    )
    .await
    .expect("Failed to initialise app state"),
  );

  plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::cron::ReconcileScan)
    .register(plugins::cron::AnniversaryDigest)
    .run(app)
    .await;

  tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
  info!("Shutting down");
}
