//! PostgreSQL store for the outbound message distribution layer. The durable
//! store is the single shared resource across worker processes: the
//! one-open-bundle rule, the no-attach-after-seal rule, and render-once are
//! all enforced here through conditional updates and unique constraints.

mod actor_queue_repository;
mod bundle_repository;
mod client;
mod config;
mod document_store;
mod models;
mod outgoing_message_repository;

pub use actor_queue_repository::PostgresActorQueueRepository;
pub use bundle_repository::PostgresBundleRepository;
pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use document_store::PostgresDocumentStore;
pub use outgoing_message_repository::PostgresOutgoingMessageRepository;
