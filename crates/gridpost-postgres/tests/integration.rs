use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

use gridpost_domain::{
    ActorNumber, ActorRole, ActorQueueRepository, Bundle, BundleKey, BundleRepository,
    BundlingConfig, BusinessReason, DocumentFactory, DocumentFormat, DocumentStore, DocumentType,
    DomainError, DomainResult, EnqueueMessageInput, EnqueueService, GridArea, MarketActor,
    MarketDocument, MessageCategory, OutgoingMessage, OutgoingMessageRepository, PeekService,
    DequeueOutcome, DequeueService,
};
use gridpost_domain::delegation::DelegationResolver;
use gridpost_domain::types::DelegatedProcess;
use gridpost_postgres::{
    PostgresActorQueueRepository, PostgresBundleRepository, PostgresClient, PostgresConfig,
    PostgresDocumentStore, PostgresOutgoingMessageRepository,
};

struct NoDelegations;

#[async_trait]
impl DelegationResolver for NoDelegations {
    async fn active_delegation(
        &self,
        _delegated_by: MarketActor,
        _process: DelegatedProcess,
        _grid_area: Option<GridArea>,
    ) -> DomainResult<Option<MarketActor>> {
        Ok(None)
    }
}

struct ConcatFactory;

#[async_trait]
impl DocumentFactory for ConcatFactory {
    async fn render(
        &self,
        _bundle: Bundle,
        messages: Vec<OutgoingMessage>,
        _format: DocumentFormat,
    ) -> DomainResult<Vec<u8>> {
        Ok(messages
            .iter()
            .map(|m| m.payload.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes())
    }
}

async fn start_client(postgres: &testcontainers::ContainerAsync<Postgres>) -> PostgresClient {
    let host = postgres.get_host().await.unwrap();
    let port = postgres.get_host_port_ipv4(5432).await.unwrap();

    let client = PostgresClient::new(&PostgresConfig {
        host: host.to_string(),
        port,
        database: "postgres".to_string(),
        username: "postgres".to_string(),
        password: "postgres".to_string(),
        max_pool_size: 5,
    })
    .unwrap();

    client.ping().await.unwrap();
    client.apply_schema().await.unwrap();
    client
}

fn supplier() -> MarketActor {
    MarketActor::new(
        ActorNumber::new("5790001234567").unwrap(),
        ActorRole::EnergySupplier,
    )
}

fn aggregation_input(payload: &str) -> EnqueueMessageInput {
    EnqueueMessageInput {
        document_type: DocumentType::NotifyAggregatedMeasureData,
        message_category: MessageCategory::Aggregations,
        receiver: supplier(),
        sender: MarketActor::new(
            ActorNumber::new("5790000000005").unwrap(),
            ActorRole::SystemOperator,
        ),
        business_reason: BusinessReason::BalanceFixing,
        grid_area: None,
        event_id: "event-1".to_string(),
        process_id: None,
        related_to_message_id: None,
        payload: payload.to_string(),
        data_point_count: 0,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn schema_applies_and_connection_pings() {
    let postgres = Postgres::default().start().await.unwrap();
    let client = start_client(&postgres).await;
    // Applying twice must be a no-op.
    client.apply_schema().await.unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn queue_get_or_create_is_idempotent() {
    let postgres = Postgres::default().start().await.unwrap();
    let client = start_client(&postgres).await;
    let queues = PostgresActorQueueRepository::new(client);

    let first = queues.get_or_create(supplier()).await.unwrap();
    let second = queues.get_or_create(supplier()).await.unwrap();
    assert_eq!(first.queue_id, second.queue_id);

    let found = queues.find_by_receiver(supplier()).await.unwrap().unwrap();
    assert_eq!(found.queue_id, first.queue_id);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn open_bundle_uniqueness_is_store_enforced() {
    let postgres = Postgres::default().start().await.unwrap();
    let client = start_client(&postgres).await;
    let queues = PostgresActorQueueRepository::new(client.clone());
    let bundles = PostgresBundleRepository::new(client);

    let queue = queues.get_or_create(supplier()).await.unwrap();
    let config = BundlingConfig::default();
    let key = BundleKey {
        queue_id: queue.queue_id,
        business_reason: BusinessReason::BalanceFixing,
        document_type: DocumentType::NotifyAggregatedMeasureData,
        message_category: MessageCategory::Aggregations,
    };
    let policy = config.policy_for(MessageCategory::Aggregations);

    let first = Bundle::new(key.clone(), &policy, None);
    bundles.create(first.clone()).await.unwrap();

    let err = bundles
        .create(Bundle::new(key.clone(), &policy, None))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::BundleAlreadyOpen(_)));

    // Sealing frees the key's open slot.
    assert!(bundles
        .close(first.bundle_id.clone(), Utc::now())
        .await
        .unwrap());
    assert!(!bundles.close(first.bundle_id, Utc::now()).await.unwrap());
    bundles
        .create(Bundle::new(key, &policy, None))
        .await
        .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn attach_refuses_sealed_and_full_bundles() {
    let postgres = Postgres::default().start().await.unwrap();
    let client = start_client(&postgres).await;
    let queues = PostgresActorQueueRepository::new(client.clone());
    let bundles = PostgresBundleRepository::new(client.clone());
    let messages = PostgresOutgoingMessageRepository::new(client);

    let queue = queues.get_or_create(supplier()).await.unwrap();
    let config = BundlingConfig {
        max_bundle_message_count: 1,
        ..BundlingConfig::default()
    };
    let key = BundleKey {
        queue_id: queue.queue_id,
        business_reason: BusinessReason::BalanceFixing,
        document_type: DocumentType::NotifyAggregatedMeasureData,
        message_category: MessageCategory::Aggregations,
    };
    let bundle = Bundle::new(
        key,
        &config.policy_for(MessageCategory::Aggregations),
        None,
    );
    bundles.create(bundle.clone()).await.unwrap();

    let message = OutgoingMessage::from_input(aggregation_input("one"), supplier());
    assert!(bundles
        .attach_message(bundle.bundle_id.clone(), message)
        .await
        .unwrap());

    // Full now (cap 1). A refused attach must persist nothing.
    let overflow = OutgoingMessage::from_input(aggregation_input("two"), supplier());
    assert!(!bundles
        .attach_message(bundle.bundle_id.clone(), overflow.clone())
        .await
        .unwrap());
    let stored = messages.list_by_bundle(bundle.bundle_id.clone()).await.unwrap();
    assert_eq!(stored.len(), 1);

    // Sealed bundles refuse attaches outright.
    bundles
        .close(bundle.bundle_id.clone(), Utc::now())
        .await
        .unwrap();
    assert!(!bundles
        .attach_message(bundle.bundle_id, overflow)
        .await
        .unwrap());
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn render_once_and_full_protocol_roundtrip() {
    let postgres = Postgres::default().start().await.unwrap();
    let client = start_client(&postgres).await;

    let queues = Arc::new(PostgresActorQueueRepository::new(client.clone()));
    let bundles = Arc::new(PostgresBundleRepository::new(client.clone()));
    let messages = Arc::new(PostgresOutgoingMessageRepository::new(client.clone()));
    let documents = Arc::new(PostgresDocumentStore::new(client));

    let config = BundlingConfig::default();
    let enqueue = EnqueueService::new(
        queues.clone(),
        bundles.clone(),
        Arc::new(NoDelegations),
        config.clone(),
    );
    let peek = PeekService::new(
        queues,
        bundles.clone(),
        messages,
        documents.clone(),
        Arc::new(ConcatFactory),
        config,
    );
    let dequeue = DequeueService::new(bundles.clone());

    enqueue.enqueue(aggregation_input("result-1")).await.unwrap();
    enqueue.enqueue(aggregation_input("result-2")).await.unwrap();

    let first = peek
        .peek(
            supplier(),
            MessageCategory::Aggregations,
            DocumentFormat::CimXml,
        )
        .await
        .unwrap()
        .expect("bundle should be peekable");
    assert_eq!(first.document, b"result-1\nresult-2".to_vec());

    // The stored artifact wins every later peek, even a competing render
    // that would have produced different bytes.
    let sealed = bundles
        .find_closed_by_peek_message_id(first.message_id.clone())
        .await
        .unwrap()
        .unwrap();
    let competing = documents
        .insert_or_get(MarketDocument {
            bundle_id: sealed.bundle_id.clone(),
            format: DocumentFormat::CimXml,
            payload: b"competing".to_vec(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    assert_eq!(competing.payload, first.document);

    let second = peek
        .peek(
            supplier(),
            MessageCategory::Aggregations,
            DocumentFormat::CimXml,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.message_id, first.message_id);
    assert_eq!(second.document, first.document);

    assert_eq!(
        dequeue.dequeue(first.message_id.clone()).await.unwrap(),
        DequeueOutcome::Acknowledged
    );
    assert_eq!(
        dequeue.dequeue(first.message_id).await.unwrap(),
        DequeueOutcome::NotFound
    );
    assert!(peek
        .peek(
            supplier(),
            MessageCategory::Aggregations,
            DocumentFormat::CimXml,
        )
        .await
        .unwrap()
        .is_none());
}
