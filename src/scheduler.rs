use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::Config;
use crate::models::IngestMethod;
use crate::sync::InventorySync;

/// Start periodic runs for every method that has an interval configured
///
/// Runs of one method never overlap each other: the next tick is only taken
/// after the current run returns, and late ticks are skipped.
pub fn spawn_scheduled_syncs(sync: Arc<InventorySync>, config: &Config) -> Vec<JoinHandle<()>> {
    IngestMethod::ALL
        .into_iter()
        .filter_map(|method| {
            let period = match method {
                IngestMethod::Query => config.query_sync_interval,
                IngestMethod::Snapshot => config.snapshot_sync_interval,
            }
            .filter(|p| !p.is_zero())?;
            Some(spawn_schedule(sync.clone(), method, period))
        })
        .collect()
}

fn spawn_schedule(sync: Arc<InventorySync>, method: IngestMethod, period: Duration) -> JoinHandle<()> {
    tracing::info!("Scheduling {} sync every {}s", method, period.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            tracing::info!("Scheduled {} sync started", method);
            let outcome = sync.run(method).await;
            if !outcome.success {
                tracing::warn!(
                    "Scheduled {} sync failed: {}",
                    method,
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    })
}
