/// Periodic refresh of stale playlists
use crate::config::WatchSettings;
use marquee_sync::{PlaylistRefresher, RefreshReport, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

pub struct RefreshWatcher {
    refresher: Arc<PlaylistRefresher>,
    interval: Duration,
    batch_size: u32,
}

impl RefreshWatcher {
    pub fn new(refresher: Arc<PlaylistRefresher>, settings: &WatchSettings) -> Self {
        Self {
            refresher,
            interval: Duration::from_secs(settings.interval_secs),
            batch_size: settings.batch_size,
        }
    }

    /// Run one sweep over stale playlists
    pub async fn run_once(&self) -> Result<RefreshReport> {
        self.refresher.refresh_stale(self.batch_size).await
    }

    /// Sweep forever; a failed sweep is logged and retried at the next tick
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            batch_size = self.batch_size,
            "Refresh watcher started"
        );

        loop {
            ticker.tick().await;

            match self.run_once().await {
                Ok(report) if report.total() > 0 => tracing::info!(
                    refreshed = report.refreshed,
                    unchanged = report.unchanged,
                    deleted = report.deleted,
                    failed = report.failed,
                    "Sweep finished"
                ),
                Ok(_) => tracing::debug!("Sweep found nothing stale"),
                Err(e) => tracing::error!(error = %e, "Sweep failed"),
            }
        }
    }
}
