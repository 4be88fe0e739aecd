use async_trait::async_trait;
use gridpost_domain::error::{DomainError, DomainResult};
use gridpost_domain::{DocumentStore, MarketDocument};
use tracing::debug;

use crate::client::PostgresClient;
use crate::models::document_from_row;

#[derive(Clone)]
pub struct PostgresDocumentStore {
    client: PostgresClient,
}

impl PostgresDocumentStore {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn find(&self, bundle_id: String) -> DomainResult<Option<MarketDocument>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT bundle_id, document_format, payload, created_at
                 FROM market_document WHERE bundle_id = $1",
                &[&bundle_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn insert_or_get(&self, document: MarketDocument) -> DomainResult<MarketDocument> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // First committed render wins; a losing renderer's artifact is
        // dropped by the DO NOTHING and the stored row is reselected.
        let inserted = conn
            .execute(
                "INSERT INTO market_document (bundle_id, document_format, payload, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (bundle_id) DO NOTHING",
                &[
                    &document.bundle_id,
                    &document.format.as_str(),
                    &document.payload,
                    &document.created_at,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if inserted == 0 {
            debug!(bundle_id = %document.bundle_id, "lost render race, reusing stored document");
        }

        let row = conn
            .query_one(
                "SELECT bundle_id, document_format, payload, created_at
                 FROM market_document WHERE bundle_id = $1",
                &[&document.bundle_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        document_from_row(&row)
    }
}
