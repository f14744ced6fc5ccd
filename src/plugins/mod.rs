pub mod cron;
pub mod server;

use std::sync::Arc;

use crate::state::AppState;

/// A unit of background machinery: the HTTP server or a periodic job.
/// `start` spawns whatever tasks the plugin needs and returns; a failed
/// start is logged and does not bring the process down.
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
  fn name(&self) -> &'static str {
    std::any::type_name::<Self>()
  }

  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()>;
}

pub struct App {
  plugins: Vec<Box<dyn Plugin>>,
}

impl App {
  pub fn new() -> Self {
    Self { plugins: Vec::new() }
  }

  pub fn register<P: Plugin + 'static>(mut self, plugin: P) -> Self {
    self.plugins.push(Box::new(plugin));
    self
  }

  pub async fn run(self, app: Arc<AppState>) {
    for plugin in self.plugins {
      let name = plugin.name();
      tracing::info!("starting `{name}`");

      if let Err(err) = plugin.start(app.clone()).await {
        tracing::error!("plugin `{name}` failed to start: {err}");
      }
    }
  }
}
