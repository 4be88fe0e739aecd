use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::actor_queue::ActorMessageQueue;
use crate::bundle::{Bundle, BundleKey};
use crate::delegation::DelegationResolver;
use crate::error::{DomainError, DomainResult};
use crate::outgoing_message::{EnqueueMessageInput, OutgoingMessage};
use crate::policy::BundlingConfig;
use crate::repository::{ActorQueueRepository, BundleRepository};
use crate::types::MarketActor;

/// Bound on find/attach/create cycles before giving up on a key. Each lost
/// race means another worker made progress on the same key, so a handful of
/// retries is always enough in practice.
const ATTACH_ATTEMPTS: usize = 4;

/// Outcome of a bulk enqueue. Each item's outcome is independent; the caller
/// decides whether any failure is fatal for the surrounding business process.
#[derive(Debug)]
pub struct EnqueueManyOutcome {
    /// Message ids of successfully enqueued items, in input order.
    pub accepted: Vec<String>,
    pub failed: Vec<EnqueueFailure>,
}

#[derive(Debug)]
pub struct EnqueueFailure {
    /// Index of the failed item in the input batch.
    pub index: usize,
    pub error: DomainError,
}

impl EnqueueManyOutcome {
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Validates, delegates, and attaches an outgoing message to the right queue
/// and bundle. The message itself is persisted inside the attach operation,
/// so a failed or abandoned enqueue leaves no partial state.
pub struct EnqueueService {
    queues: Arc<dyn ActorQueueRepository>,
    bundles: Arc<dyn BundleRepository>,
    delegations: Arc<dyn DelegationResolver>,
    config: BundlingConfig,
}

impl EnqueueService {
    pub fn new(
        queues: Arc<dyn ActorQueueRepository>,
        bundles: Arc<dyn BundleRepository>,
        delegations: Arc<dyn DelegationResolver>,
        config: BundlingConfig,
    ) -> Self {
        Self {
            queues,
            bundles,
            delegations,
            config,
        }
    }

    /// Enqueues one message and returns its id.
    pub async fn enqueue(&self, input: EnqueueMessageInput) -> DomainResult<String> {
        self.validate(&input)?;

        let receiver = self.resolve_receiver(&input).await?;

        debug!(
            receiver = %receiver,
            document_type = %input.document_type,
            category = %input.message_category,
            "enqueueing outgoing message"
        );

        let message = OutgoingMessage::from_input(input, receiver.clone());
        let message_id = message.message_id.clone();

        let queue = self.queues.get_or_create(receiver).await?;
        let bundle_id = self.attach(&queue, message).await?;

        info!(
            message_id = %message_id,
            bundle_id = %bundle_id,
            queue_id = %queue.queue_id,
            "outgoing message enqueued"
        );
        Ok(message_id)
    }

    /// Enqueues a batch with independent per-item outcomes.
    pub async fn enqueue_many(&self, inputs: Vec<EnqueueMessageInput>) -> EnqueueManyOutcome {
        let mut outcome = EnqueueManyOutcome {
            accepted: Vec::with_capacity(inputs.len()),
            failed: Vec::new(),
        };
        for (index, input) in inputs.into_iter().enumerate() {
            match self.enqueue(input).await {
                Ok(message_id) => outcome.accepted.push(message_id),
                Err(error) => {
                    warn!(index, error = %error, "enqueue failed for batch item");
                    outcome.failed.push(EnqueueFailure { index, error });
                }
            }
        }
        outcome
    }

    fn validate(&self, input: &EnqueueMessageInput) -> DomainResult<()> {
        if input.event_id.is_empty() {
            return Err(DomainError::InvalidMessage(
                "event id is required".to_string(),
            ));
        }
        if input.payload.is_empty() {
            return Err(DomainError::InvalidMessage(
                "payload must not be empty".to_string(),
            ));
        }
        let policy = self.config.policy_for(input.message_category);
        if let Some(max) = policy.max_data_count {
            if input.data_point_count == 0 {
                return Err(DomainError::InvalidMessage(format!(
                    "a data point count is required for category {}",
                    input.message_category
                )));
            }
            if input.data_point_count > max {
                return Err(DomainError::InvalidMessage(format!(
                    "message carries {} data points, which exceeds the bundle cap of {max}",
                    input.data_point_count
                )));
            }
        }
        Ok(())
    }

    /// Resolves the final receiver, substituting an active delegate before
    /// any persistence so the bundle key is derived from the delegate. A
    /// resolver failure fails the enqueue; delivering to the original
    /// receiver despite a configured delegation would be misdelivery.
    async fn resolve_receiver(&self, input: &EnqueueMessageInput) -> DomainResult<MarketActor> {
        if !self.config.delegation_enabled {
            return Ok(input.receiver.clone());
        }
        let Some(process) = input.business_reason.delegated_process() else {
            return Ok(input.receiver.clone());
        };
        match self
            .delegations
            .active_delegation(input.receiver.clone(), process, input.grid_area.clone())
            .await?
        {
            Some(delegate) => {
                info!(
                    original = %input.receiver,
                    delegate = %delegate,
                    "delegation applied before bundling"
                );
                Ok(delegate)
            }
            None => Ok(input.receiver.clone()),
        }
    }

    /// Attaches the message to the queue's open bundle for its key, creating
    /// a new bundle when none is open or the open one cannot take the
    /// message. The message row is written inside the winning attach, so the
    /// whole enqueue commits or leaves nothing. Every step is a conditional
    /// store operation; concurrent enqueuers, the scheduler and peek can race
    /// freely, a lost race shows up as `false`/`BundleAlreadyOpen` and is
    /// retried.
    async fn attach(
        &self,
        queue: &ActorMessageQueue,
        message: OutgoingMessage,
    ) -> DomainResult<String> {
        let key = BundleKey {
            queue_id: queue.queue_id.clone(),
            business_reason: message.business_reason,
            document_type: message.document_type,
            message_category: message.message_category,
        };
        let policy = self.config.policy_for(message.message_category);

        for attempt in 0..ATTACH_ATTEMPTS {
            if let Some(bundle) = self.bundles.find_open(key.clone()).await? {
                if self
                    .bundles
                    .attach_message(bundle.bundle_id.clone(), message.clone())
                    .await?
                {
                    return Ok(bundle.bundle_id);
                }
                // Full or sealed under us. A full bundle must be sealed here
                // so the key's unique open slot frees up; if peek or the
                // scheduler sealed it first this is a no-op.
                self.bundles
                    .close(bundle.bundle_id.clone(), Utc::now())
                    .await?;
            }

            let bundle = Bundle::new(
                key.clone(),
                &policy,
                message.related_to_message_id.clone(),
            );
            match self.bundles.create(bundle.clone()).await {
                Ok(()) => {
                    info!(
                        bundle_id = %bundle.bundle_id,
                        queue_id = %queue.queue_id,
                        category = %bundle.message_category,
                        "bundle created"
                    );
                    if self
                        .bundles
                        .attach_message(bundle.bundle_id.clone(), message.clone())
                        .await?
                    {
                        return Ok(bundle.bundle_id);
                    }
                    // The fresh bundle was sealed before we could attach
                    // (scheduler racing on an aged key); go around again.
                }
                Err(DomainError::BundleAlreadyOpen(_)) => {
                    warn!(attempt, queue_id = %queue.queue_id, "lost bundle-create race, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::RepositoryError(anyhow::anyhow!(
            "could not attach message {} after {ATTACH_ATTEMPTS} attempts",
            message.message_id
        )))
    }
}
