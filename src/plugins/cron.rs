use std::sync::Arc;

use async_trait::async_trait;

use crate::{
  plugins::Plugin,
  prelude::*,
  state::AppState,
  sv,
  utils::{format_date, format_euros},
};

/// Periodic reconciliation: installed leads that somehow lack a reward
/// row (the status update committed but reward creation failed). The
/// scan only reports — writes are never retried automatically, to keep
/// duplicate rewards impossible.
pub struct ReconcileScan;

#[async_trait]
impl Plugin for ReconcileScan {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    tokio::spawn(async move {
      let mut interval =
        tokio::time::interval(app.config.reconcile_interval);
      // skip the tick fired at startup
      interval.tick().await;

      loop {
        interval.tick().await;

        match sv::Ledger::new(&app.db).orphaned_installations().await {
          Ok(orphans) if orphans.is_empty() => {
            debug!("reconcile scan: ledger consistent")
          }
          Ok(orphans) => {
            for lead in &orphans {
              warn!(
                "lead {} is installed but has no reward record",
                lead.id
              );
            }
            let ids: Vec<i32> =
              orphans.iter().map(|lead| lead.id).collect();
            app.notify.send_admin(
              "Parrainage: incohérences détectées",
              &format!(
                "{} lead(s) installés sans commission: {:?}",
                orphans.len(),
                ids
              ),
            );
          }
          Err(err) => error!("reconcile scan failed: {err}"),
        }
      }
    });

    Ok(())
  }
}

/// Daily digest of partners near their reward anniversary with unpaid
/// vouchers, mailed to the admin for follow-up.
pub struct AnniversaryDigest;

#[async_trait]
impl Plugin for AnniversaryDigest {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    tokio::spawn(async move {
      let mut interval = tokio::time::interval(app.config.digest_interval);
      interval.tick().await;

      loop {
        interval.tick().await;

        match sv::Stats::new(&app.db).anniversary_alerts().await {
          Ok(alerts) if alerts.is_empty() => {
            debug!("anniversary digest: nothing to report")
          }
          Ok(alerts) => {
            let lines: Vec<String> = alerts
              .iter()
              .map(|alert| {
                format!(
                  "- {} : {} en attente, anniversaire le {}{}",
                  alert.full_name,
                  format_euros(alert.vouchers_pending_cents),
                  format_date(alert.anniversary_date),
                  if alert.passed { " (dépassé)" } else { "" }
                )
              })
              .collect();

            info!("anniversary digest: {} partner(s)", alerts.len());
            app.notify.send_admin(
              "Parrainage: anniversaires à traiter",
              &lines.join("\n"),
            );
          }
          Err(err) => error!("anniversary digest failed: {err}"),
        }
      }
    });

    Ok(())
  }
}
