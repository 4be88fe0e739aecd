use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::actor_queue::ActorMessageQueue;
use crate::bundle::{Bundle, BundleKey};
use crate::error::DomainResult;
use crate::market_document::MarketDocument;
use crate::outgoing_message::OutgoingMessage;
use crate::types::{MessageCategory, Receiver};

/// Storage for per-receiver queues. Uniqueness of (actor number, role) is the
/// store's responsibility; concurrent first-enqueues must converge on one
/// queue without in-process locking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorQueueRepository: Send + Sync {
    /// Idempotent create-or-fetch for a receiver's queue.
    async fn get_or_create(&self, receiver: Receiver) -> DomainResult<ActorMessageQueue>;

    async fn find_by_receiver(&self, receiver: Receiver)
        -> DomainResult<Option<ActorMessageQueue>>;
}

/// Read side for outgoing messages. Messages are only ever written through
/// `BundleRepository::attach_message`, so a persisted message always belongs
/// to a bundle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutgoingMessageRepository: Send + Sync {
    /// Messages of a bundle in attachment order.
    async fn list_by_bundle(&self, bundle_id: String) -> DomainResult<Vec<OutgoingMessage>>;
}

/// Storage for bundles. The cross-process invariants (one open bundle per
/// key, no attach after close) are enforced here through conditional updates
/// and unique constraints, never through in-process locks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BundleRepository: Send + Sync {
    /// Persists a new open bundle. Fails with `DomainError::BundleAlreadyOpen`
    /// when an open bundle for the same key already exists.
    async fn create(&self, bundle: Bundle) -> DomainResult<()>;

    async fn find_open(&self, key: BundleKey) -> DomainResult<Option<Bundle>>;

    /// Atomically reserves a slot in the bundle and persists the message into
    /// it, as one all-or-nothing store operation. Returns `false` (persisting
    /// nothing) when the bundle is closed or cannot fit the message; the
    /// caller then moves on to a fresh bundle. An enqueue that never attaches
    /// therefore leaves no message row behind.
    async fn attach_message(&self, bundle_id: String, message: OutgoingMessage)
        -> DomainResult<bool>;

    /// Seals a bundle. Conditional on the bundle still being open; returns
    /// `false` when someone else sealed it first, which callers treat as
    /// success.
    async fn close(&self, bundle_id: String, closed_at: DateTime<Utc>) -> DomainResult<bool>;

    /// Oldest not-yet-dequeued bundle for a queue and category, in creation
    /// order. With `require_closed` only sealed bundles are considered (the
    /// peek path for scheduler-owned categories).
    async fn oldest_peekable(
        &self,
        queue_id: String,
        category: MessageCategory,
        require_closed: bool,
    ) -> DomainResult<Option<Bundle>>;

    /// All open bundles of a category, for the bundling scheduler.
    async fn list_open(&self, category: MessageCategory) -> DomainResult<Vec<Bundle>>;

    /// Lookup for dequeue: only closed bundles, addressed by the peek
    /// message id.
    async fn find_closed_by_peek_message_id(
        &self,
        peek_message_id: String,
    ) -> DomainResult<Option<Bundle>>;

    /// Deletes the bundle together with its messages and its rendered
    /// document as one atomic unit. Returns `false` when the bundle row was
    /// already gone, so racing removers can tell winner from loser.
    async fn remove(&self, bundle_id: String) -> DomainResult<bool>;
}

/// Storage for rendered documents (render-once, read-many).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, bundle_id: String) -> DomainResult<Option<MarketDocument>>;

    /// Persists the document unless one already exists for the bundle, and
    /// returns whichever artifact won. Resolves the duplicate-render race in
    /// favor of the first committed document.
    async fn insert_or_get(&self, document: MarketDocument) -> DomainResult<MarketDocument>;
}
