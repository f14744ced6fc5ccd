use std::env;

use migration::{Migrator, MigratorTrait};

use crate::{auth::Identity, notify::Notifier, prelude::*};

/// Answers "is this identity an administrator". Swappable; the default
/// policy is the fixed allow-list from the environment.
pub trait AdminPolicy: Send + Sync {
  fn is_admin(&self, identity: &Identity) -> bool;
}

pub struct FixedAdminList {
  ids: HashSet<Uuid>,
  emails: HashSet<String>,
}

impl FixedAdminList {
  pub fn from_env() -> Self {
    let ids = env::var("ADMIN_IDS")
      .unwrap_or_default()
      .split(',')
      .filter(|s| !s.trim().is_empty())
      .map(|id| id.trim().parse().expect("Invalid admin id format"))
      .collect();

    let emails = env::var("ADMIN_EMAILS")
      .unwrap_or_default()
      .split(',')
      .filter(|s| !s.trim().is_empty())
      .map(|email| email.trim().to_lowercase())
      .collect();

    Self { ids, emails }
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty() && self.emails.is_empty()
  }
}

impl AdminPolicy for FixedAdminList {
  fn is_admin(&self, identity: &Identity) -> bool {
    if self.ids.contains(&identity.id) {
      return true;
    }
    identity
      .email
      .as_deref()
      .is_some_and(|email| self.emails.contains(&email.to_lowercase()))
  }
}

pub struct Config {
  pub reconcile_interval: Duration,
  pub digest_interval: Duration,
}

impl Config {
  pub fn from_env() -> Self {
    Self {
      reconcile_interval: interval_from_env("RECONCILE_INTERVAL", "1h"),
      digest_interval: interval_from_env("DIGEST_INTERVAL", "24h"),
    }
  }
}

fn interval_from_env(key: &str, default: &str) -> Duration {
  let raw = env::var(key).unwrap_or_else(|_| default.into());
  humantime::parse_duration(&raw)
    .unwrap_or_else(|err| panic!("Invalid {key}: {err}"))
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub acl: Arc<dyn AdminPolicy>,
  pub secret: String,
  pub config: Config,
  pub notify: Notifier,
}

impl AppState {
  pub async fn new(
    db_url: &str,
    acl: Arc<dyn AdminPolicy>,
    secret: String,
    config: Config,
    notify: Notifier,
  ) -> anyhow::Result<Self> {
    let db = Database::connect(db_url).await?;
    Migrator::up(&db, None).await?;

    Ok(Self { db, acl, secret, config, notify })
  }

  pub fn is_admin(&self, identity: &Identity) -> bool {
    self.acl.is_admin(identity)
  }
}
