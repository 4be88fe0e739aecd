use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::document_factory::DocumentFactory;
use crate::error::DomainResult;
use crate::market_document::{MarketDocument, PeekedDocument};
use crate::policy::BundlingConfig;
use crate::repository::{
    ActorQueueRepository, BundleRepository, DocumentStore, OutgoingMessageRepository,
};
use crate::types::{DocumentFormat, MessageCategory, Receiver};

/// The pull protocol's read side. Serves the oldest not-yet-dequeued bundle
/// for a receiver and category, sealing it first where the policy says peek
/// owns sealing, and rendering its document exactly once.
pub struct PeekService {
    queues: Arc<dyn ActorQueueRepository>,
    bundles: Arc<dyn BundleRepository>,
    messages: Arc<dyn OutgoingMessageRepository>,
    documents: Arc<dyn DocumentStore>,
    factory: Arc<dyn DocumentFactory>,
    config: BundlingConfig,
}

impl PeekService {
    pub fn new(
        queues: Arc<dyn ActorQueueRepository>,
        bundles: Arc<dyn BundleRepository>,
        messages: Arc<dyn OutgoingMessageRepository>,
        documents: Arc<dyn DocumentStore>,
        factory: Arc<dyn DocumentFactory>,
        config: BundlingConfig,
    ) -> Self {
        Self {
            queues,
            bundles,
            messages,
            documents,
            factory,
            config,
        }
    }

    /// Returns the next bundle's document for the receiver, or `None` when
    /// nothing is ready. "Nothing there" is a normal outcome of polling, not
    /// an error.
    pub async fn peek(
        &self,
        receiver: Receiver,
        category: MessageCategory,
        format: DocumentFormat,
    ) -> DomainResult<Option<PeekedDocument>> {
        debug!(receiver = %receiver, category = %category, "peek requested");

        let Some(queue) = self.queues.find_by_receiver(receiver).await? else {
            return Ok(None);
        };

        // Windowed categories are sealed by the scheduler only: an open
        // bundle is not ready yet and must not be served. For immediate
        // categories peek itself seals the oldest bundle.
        let policy = self.config.policy_for(category);
        let Some(bundle) = self
            .bundles
            .oldest_peekable(queue.queue_id.clone(), category, policy.sealed_by_scheduler)
            .await?
        else {
            return Ok(None);
        };

        if bundle.closed_at.is_none() {
            // The seal commits before any rendering happens, so an enqueue
            // racing with this peek can no longer slip a message into the
            // bundle being served. Losing the seal race to the scheduler or
            // another peek is equivalent to winning it.
            self.bundles
                .close(bundle.bundle_id.clone(), Utc::now())
                .await?;
            info!(bundle_id = %bundle.bundle_id, "bundle sealed by peek");
        }

        let document = match self.documents.find(bundle.bundle_id.clone()).await? {
            Some(existing) => existing,
            None => {
                // Rendering runs outside any store transaction; the
                // insert-or-get afterwards resolves concurrent renders in
                // favor of the first committed artifact.
                let messages = self.messages.list_by_bundle(bundle.bundle_id.clone()).await?;
                let payload = self.factory.render(bundle.clone(), messages, format).await?;
                info!(
                    bundle_id = %bundle.bundle_id,
                    format = %format,
                    size = payload.len(),
                    "document rendered"
                );
                self.documents
                    .insert_or_get(MarketDocument {
                        bundle_id: bundle.bundle_id.clone(),
                        format,
                        payload,
                        created_at: Utc::now(),
                    })
                    .await?
            }
        };

        Ok(Some(PeekedDocument {
            message_id: bundle.peek_message_id,
            format: document.format,
            document: document.payload,
        }))
    }
}
