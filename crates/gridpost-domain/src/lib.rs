//! Domain model and services for the outbound message distribution layer:
//! message enqueueing with receiver delegation, per-actor bundling, the
//! scheduler that seals windowed bundles, and the peek/dequeue pull protocol.

pub mod actor_queue;
pub mod bundle;
pub mod bundling_service;
pub mod delegation;
pub mod dequeue_service;
pub mod document_factory;
pub mod enqueue_service;
pub mod error;
pub mod in_memory;
pub mod market_document;
pub mod outgoing_message;
pub mod peek_service;
pub mod policy;
pub mod repository;
pub mod types;

pub use actor_queue::ActorMessageQueue;
pub use bundle::{Bundle, BundleKey};
pub use bundling_service::BundlingService;
pub use delegation::DelegationResolver;
pub use dequeue_service::{DequeueOutcome, DequeueService};
pub use document_factory::DocumentFactory;
pub use enqueue_service::{EnqueueFailure, EnqueueManyOutcome, EnqueueService};
pub use error::{DomainError, DomainResult};
pub use in_memory::InMemoryStore;
pub use market_document::{MarketDocument, PeekedDocument};
pub use outgoing_message::{EnqueueMessageInput, OutgoingMessage};
pub use peek_service::PeekService;
pub use policy::{BundlingConfig, BundlingPolicy};
pub use repository::{
    ActorQueueRepository, BundleRepository, DocumentStore, OutgoingMessageRepository,
};
pub use types::{
    ActorNumber, ActorRole, BusinessReason, DelegatedProcess, DocumentFormat, DocumentType,
    GridArea, MarketActor, MessageCategory, Receiver, Sender,
};
