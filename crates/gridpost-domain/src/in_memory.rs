use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::actor_queue::ActorMessageQueue;
use crate::bundle::{Bundle, BundleKey};
use crate::error::{DomainError, DomainResult};
use crate::market_document::MarketDocument;
use crate::outgoing_message::OutgoingMessage;
use crate::repository::{
    ActorQueueRepository, BundleRepository, DocumentStore, OutgoingMessageRepository,
};
use crate::types::{ActorRole, MessageCategory, Receiver};

/// In-memory implementation of all four store traits behind a single lock.
/// Each trait method takes the write or read lock exactly once, which gives
/// every store operation the same all-or-nothing behavior the durable store
/// provides through transactions. Suitable for tests and single-process use.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    queues: HashMap<(String, ActorRole), ActorMessageQueue>,
    bundles: HashMap<String, Bundle>,
    /// Message ids per bundle in attachment order.
    bundle_messages: HashMap<String, Vec<String>>,
    messages: HashMap<String, OutgoingMessage>,
    documents: HashMap<String, MarketDocument>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn queue_key(receiver: &Receiver) -> (String, ActorRole) {
    (receiver.actor_number.as_str().to_string(), receiver.role)
}

#[async_trait]
impl ActorQueueRepository for InMemoryStore {
    async fn get_or_create(&self, receiver: Receiver) -> DomainResult<ActorMessageQueue> {
        let mut state = self.state.write().await;
        let queue = state
            .queues
            .entry(queue_key(&receiver))
            .or_insert_with(|| ActorMessageQueue::new(receiver));
        Ok(queue.clone())
    }

    async fn find_by_receiver(
        &self,
        receiver: Receiver,
    ) -> DomainResult<Option<ActorMessageQueue>> {
        let state = self.state.read().await;
        Ok(state.queues.get(&queue_key(&receiver)).cloned())
    }
}

#[async_trait]
impl OutgoingMessageRepository for InMemoryStore {
    async fn list_by_bundle(&self, bundle_id: String) -> DomainResult<Vec<OutgoingMessage>> {
        let state = self.state.read().await;
        let ids = state.bundle_messages.get(&bundle_id);
        Ok(ids
            .into_iter()
            .flatten()
            .filter_map(|id| state.messages.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl BundleRepository for InMemoryStore {
    async fn create(&self, bundle: Bundle) -> DomainResult<()> {
        let mut state = self.state.write().await;
        let key = bundle.key();
        let open_exists = state
            .bundles
            .values()
            .any(|existing| existing.is_open() && existing.key() == key);
        if open_exists {
            return Err(DomainError::BundleAlreadyOpen(format!(
                "{}/{}/{}/{}",
                key.queue_id, key.business_reason, key.document_type, key.message_category
            )));
        }
        state
            .bundle_messages
            .insert(bundle.bundle_id.clone(), Vec::new());
        state.bundles.insert(bundle.bundle_id.clone(), bundle);
        Ok(())
    }

    async fn find_open(&self, key: BundleKey) -> DomainResult<Option<Bundle>> {
        let state = self.state.read().await;
        Ok(state
            .bundles
            .values()
            .find(|bundle| bundle.is_open() && bundle.key() == key)
            .cloned())
    }

    async fn attach_message(
        &self,
        bundle_id: String,
        mut message: OutgoingMessage,
    ) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let Some(bundle) = state.bundles.get_mut(&bundle_id) else {
            return Ok(false);
        };
        if !bundle.can_accept(message.data_point_count) {
            return Ok(false);
        }
        bundle.message_count += 1;
        bundle.data_count += message.data_point_count;
        // The message row only comes into existence together with its
        // assignment; a refused attach persists nothing.
        message.assigned_bundle_id = Some(bundle_id.clone());
        let message_id = message.message_id.clone();
        state.messages.insert(message_id.clone(), message);
        state
            .bundle_messages
            .entry(bundle_id)
            .or_default()
            .push(message_id);
        Ok(true)
    }

    async fn close(&self, bundle_id: String, closed_at: DateTime<Utc>) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        match state.bundles.get_mut(&bundle_id) {
            Some(bundle) if bundle.is_open() => {
                bundle.closed_at = Some(closed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn oldest_peekable(
        &self,
        queue_id: String,
        category: MessageCategory,
        require_closed: bool,
    ) -> DomainResult<Option<Bundle>> {
        let state = self.state.read().await;
        Ok(state
            .bundles
            .values()
            .filter(|bundle| {
                bundle.queue_id == queue_id
                    && bundle.message_category == category
                    && (!require_closed || bundle.closed_at.is_some())
            })
            .min_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.bundle_id.cmp(&b.bundle_id))
            })
            .cloned())
    }

    async fn list_open(&self, category: MessageCategory) -> DomainResult<Vec<Bundle>> {
        let state = self.state.read().await;
        Ok(state
            .bundles
            .values()
            .filter(|bundle| bundle.is_open() && bundle.message_category == category)
            .cloned()
            .collect())
    }

    async fn find_closed_by_peek_message_id(
        &self,
        peek_message_id: String,
    ) -> DomainResult<Option<Bundle>> {
        let state = self.state.read().await;
        Ok(state
            .bundles
            .values()
            .find(|bundle| {
                bundle.closed_at.is_some() && bundle.peek_message_id == peek_message_id
            })
            .cloned())
    }

    async fn remove(&self, bundle_id: String) -> DomainResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.bundles.remove(&bundle_id).is_some();
        state.documents.remove(&bundle_id);
        if let Some(message_ids) = state.bundle_messages.remove(&bundle_id) {
            for message_id in message_ids {
                state.messages.remove(&message_id);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, bundle_id: String) -> DomainResult<Option<MarketDocument>> {
        let state = self.state.read().await;
        Ok(state.documents.get(&bundle_id).cloned())
    }

    async fn insert_or_get(&self, document: MarketDocument) -> DomainResult<MarketDocument> {
        let mut state = self.state.write().await;
        let stored = state
            .documents
            .entry(document.bundle_id.clone())
            .or_insert(document);
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outgoing_message::EnqueueMessageInput;
    use crate::policy::BundlingConfig;
    use crate::types::{ActorNumber, BusinessReason, DocumentType, MarketActor};

    fn receiver() -> MarketActor {
        MarketActor::new(
            ActorNumber::new("5790001234567").unwrap(),
            ActorRole::EnergySupplier,
        )
    }

    fn metering_message(data_point_count: u32) -> OutgoingMessage {
        OutgoingMessage::from_input(
            EnqueueMessageInput {
                document_type: DocumentType::NotifyValidatedMeasureData,
                message_category: MessageCategory::MeasureData,
                receiver: receiver(),
                sender: receiver(),
                business_reason: BusinessReason::PeriodicMetering,
                grid_area: None,
                event_id: "event-1".to_string(),
                process_id: None,
                related_to_message_id: None,
                payload: "series".to_string(),
                data_point_count,
            },
            receiver(),
        )
    }

    fn bundle_for(queue_id: &str) -> Bundle {
        let config = BundlingConfig::default();
        Bundle::new(
            BundleKey {
                queue_id: queue_id.to_string(),
                business_reason: BusinessReason::PeriodicMetering,
                document_type: DocumentType::NotifyValidatedMeasureData,
                message_category: MessageCategory::MeasureData,
            },
            &config.policy_for(MessageCategory::MeasureData),
            None,
        )
    }

    #[tokio::test]
    async fn get_or_create_is_idempotent_per_receiver() {
        let store = InMemoryStore::new();
        let first = store.get_or_create(receiver()).await.unwrap();
        let second = store.get_or_create(receiver()).await.unwrap();
        assert_eq!(first.queue_id, second.queue_id);
    }

    #[tokio::test]
    async fn second_open_bundle_for_a_key_is_rejected() {
        let store = InMemoryStore::new();
        store.create(bundle_for("queue-1")).await.unwrap();
        let err = store.create(bundle_for("queue-1")).await.unwrap_err();
        assert!(matches!(err, DomainError::BundleAlreadyOpen(_)));
        // A different queue's key is unaffected.
        store.create(bundle_for("queue-2")).await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let store = InMemoryStore::new();
        let bundle = bundle_for("queue-1");
        let bundle_id = bundle.bundle_id.clone();
        store.create(bundle).await.unwrap();

        assert!(store.close(bundle_id.clone(), Utc::now()).await.unwrap());
        assert!(!store.close(bundle_id, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn attach_respects_the_seal() {
        let store = InMemoryStore::new();
        let bundle = bundle_for("queue-1");
        let bundle_id = bundle.bundle_id.clone();
        store.create(bundle).await.unwrap();
        store.close(bundle_id.clone(), Utc::now()).await.unwrap();

        let attached = store
            .attach_message(bundle_id, metering_message(1))
            .await
            .unwrap();
        assert!(!attached);
    }

    #[tokio::test]
    async fn refused_attach_leaves_no_message_behind() {
        let store = InMemoryStore::new();
        let bundle = bundle_for("queue-1");
        let bundle_id = bundle.bundle_id.clone();
        store.create(bundle).await.unwrap();
        store.close(bundle_id.clone(), Utc::now()).await.unwrap();

        let message = metering_message(1);
        let attached = store
            .attach_message(bundle_id.clone(), message)
            .await
            .unwrap();
        assert!(!attached);
        assert!(store.list_by_bundle(bundle_id).await.unwrap().is_empty());
        assert!(store.state.read().await.messages.is_empty());
    }

    #[tokio::test]
    async fn remove_reports_whether_the_bundle_existed() {
        let store = InMemoryStore::new();
        let bundle = bundle_for("queue-1");
        let bundle_id = bundle.bundle_id.clone();
        store.create(bundle).await.unwrap();

        assert!(store.remove(bundle_id.clone()).await.unwrap());
        assert!(!store.remove(bundle_id).await.unwrap());
    }
}
