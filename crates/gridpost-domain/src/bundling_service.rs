use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::bundle::Bundle;
use crate::error::DomainResult;
use crate::policy::BundlingConfig;
use crate::repository::BundleRepository;

/// Seals eligible open bundles of the scheduler-owned (windowed) categories
/// so actors do not wait indefinitely for a bundle to fill up. Safe to run
/// on any schedule and concurrently with itself, with enqueue, and with
/// peek: every seal is a conditional open-to-closed transition.
pub struct BundlingService {
    bundles: Arc<dyn BundleRepository>,
    config: BundlingConfig,
}

impl BundlingService {
    pub fn new(bundles: Arc<dyn BundleRepository>, config: BundlingConfig) -> Self {
        Self { bundles, config }
    }

    /// One scheduler run. Returns how many bundles this run sealed. Each
    /// bundle is sealed independently, so an interrupted run leaves a safe
    /// mix of sealed and still-open bundles.
    pub async fn seal_eligible_bundles(&self) -> DomainResult<usize> {
        self.seal_eligible_bundles_at(Utc::now()).await
    }

    /// Run against an explicit clock.
    pub async fn seal_eligible_bundles_at(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut sealed = 0;
        for category in self.config.scheduled_categories() {
            let open = self.bundles.list_open(category).await?;
            debug!(category = %category, open = open.len(), "evaluating open bundles");
            for bundle in open {
                if !self.is_eligible(&bundle, now) {
                    continue;
                }
                // A lost race here means peek, enqueue, or another scheduler
                // run sealed the bundle first; same result either way.
                if self.bundles.close(bundle.bundle_id.clone(), now).await? {
                    info!(
                        bundle_id = %bundle.bundle_id,
                        message_count = bundle.message_count,
                        data_count = bundle.data_count,
                        "bundle sealed by scheduler"
                    );
                    sealed += 1;
                }
            }
        }
        Ok(sealed)
    }

    /// Eligible when either cap is reached or the bundle is older than the
    /// configured window. The first message creates the bundle, so bundle
    /// age equals the oldest message's age.
    fn is_eligible(&self, bundle: &Bundle, now: DateTime<Utc>) -> bool {
        bundle.is_full() || now - bundle.created_at >= self.config.bundle_messages_older_than
    }
}
