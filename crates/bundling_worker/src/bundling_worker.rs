use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gridpost_domain::BundlingService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the bundling scheduler worker.
pub struct BundlingWorkerConfig {
    /// Interval between sealing runs.
    pub interval: Duration,
}

impl Default for BundlingWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// Periodically seals windowed bundles that have filled up or outlived
/// their window, making them visible to peek.
pub struct BundlingWorker {
    service: Arc<BundlingService>,
    config: BundlingWorkerConfig,
}

impl BundlingWorker {
    pub fn new(service: Arc<BundlingService>, config: BundlingWorkerConfig) -> Self {
        Self { service, config }
    }

    /// Runs sealing passes until the token is cancelled. A failed pass is
    /// logged and retried on the next tick; bundles are sealed one by one,
    /// so a failure never rolls back seals the pass already made.
    pub async fn run(self, ctx: CancellationToken) -> Result<()> {
        info!(interval_secs = self.config.interval.as_secs(), "Bundling worker started");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping bundling worker");
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {
                    match self.service.seal_eligible_bundles().await {
                        Ok(0) => debug!("bundling pass sealed nothing"),
                        Ok(sealed) => info!(sealed, "bundling pass sealed bundles"),
                        Err(e) => warn!(error = %e, "bundling pass failed"),
                    }
                }
            }
        }

        info!("Bundling worker stopped gracefully");
        Ok(())
    }
}
