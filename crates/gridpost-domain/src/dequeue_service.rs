use std::sync::Arc;

use tracing::{debug, info};

use crate::error::DomainResult;
use crate::repository::BundleRepository;

/// Result of a dequeue request. `NotFound` covers unknown ids and repeated
/// dequeues of the same id; a client may legitimately acknowledge twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueOutcome {
    Acknowledged,
    NotFound,
}

/// The pull protocol's confirmation side: removes a bundle, its messages and
/// its rendered document once the actor confirms receipt.
pub struct DequeueService {
    bundles: Arc<dyn BundleRepository>,
}

impl DequeueService {
    pub fn new(bundles: Arc<dyn BundleRepository>) -> Self {
        Self { bundles }
    }

    /// Removes the bundle identified by the peek message id. Only closed
    /// (previously peeked) bundles are addressable here, so a dequeue can
    /// never delete data an actor has not seen.
    pub async fn dequeue(&self, peek_message_id: String) -> DomainResult<DequeueOutcome> {
        match self
            .bundles
            .find_closed_by_peek_message_id(peek_message_id.clone())
            .await?
        {
            Some(bundle) => {
                // Two clients may race on the same id; only the one whose
                // delete actually hit the row gets the acknowledgement.
                if self.bundles.remove(bundle.bundle_id.clone()).await? {
                    info!(
                        bundle_id = %bundle.bundle_id,
                        peek_message_id = %peek_message_id,
                        message_count = bundle.message_count,
                        "bundle dequeued"
                    );
                    Ok(DequeueOutcome::Acknowledged)
                } else {
                    debug!(
                        bundle_id = %bundle.bundle_id,
                        peek_message_id = %peek_message_id,
                        "bundle was removed by a concurrent dequeue"
                    );
                    Ok(DequeueOutcome::NotFound)
                }
            }
            None => {
                debug!(peek_message_id = %peek_message_id, "dequeue of unknown or already-removed id");
                Ok(DequeueOutcome::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Bundle, BundleKey};
    use crate::policy::BundlingConfig;
    use crate::repository::MockBundleRepository;
    use crate::types::{BusinessReason, DocumentType, MessageCategory};
    use chrono::Utc;

    fn closed_bundle() -> Bundle {
        let config = BundlingConfig::default();
        let mut bundle = Bundle::new(
            BundleKey {
                queue_id: "queue-1".to_string(),
                business_reason: BusinessReason::BalanceFixing,
                document_type: DocumentType::NotifyAggregatedMeasureData,
                message_category: MessageCategory::Aggregations,
            },
            &config.policy_for(MessageCategory::Aggregations),
            None,
        );
        bundle.closed_at = Some(Utc::now());
        bundle
    }

    #[tokio::test]
    async fn dequeue_removes_a_closed_bundle() {
        let bundle = closed_bundle();
        let peek_message_id = bundle.peek_message_id.clone();
        let bundle_id = bundle.bundle_id.clone();

        let mut bundles = MockBundleRepository::new();
        bundles
            .expect_find_closed_by_peek_message_id()
            .times(1)
            .return_once(move |_| Ok(Some(bundle)));
        bundles
            .expect_remove()
            .withf(move |id| *id == bundle_id)
            .times(1)
            .returning(|_| Ok(true));

        let service = DequeueService::new(Arc::new(bundles));
        let outcome = service.dequeue(peek_message_id).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::Acknowledged);
    }

    #[tokio::test]
    async fn losing_the_removal_race_reports_not_found() {
        let bundle = closed_bundle();
        let peek_message_id = bundle.peek_message_id.clone();

        let mut bundles = MockBundleRepository::new();
        bundles
            .expect_find_closed_by_peek_message_id()
            .times(1)
            .return_once(move |_| Ok(Some(bundle)));
        // A concurrent dequeue deleted the bundle between find and remove.
        bundles.expect_remove().times(1).returning(|_| Ok(false));

        let service = DequeueService::new(Arc::new(bundles));
        let outcome = service.dequeue(peek_message_id).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::NotFound);
    }

    #[tokio::test]
    async fn dequeue_of_unknown_id_is_not_found_not_a_fault() {
        let mut bundles = MockBundleRepository::new();
        bundles
            .expect_find_closed_by_peek_message_id()
            .times(1)
            .returning(|_| Ok(None));
        bundles.expect_remove().times(0);

        let service = DequeueService::new(Arc::new(bundles));
        let outcome = service.dequeue("unknown".to_string()).await.unwrap();
        assert_eq!(outcome, DequeueOutcome::NotFound);
    }
}
