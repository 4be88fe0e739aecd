use async_trait::async_trait;
use gridpost_domain::error::{DomainError, DomainResult};
use gridpost_domain::{OutgoingMessage, OutgoingMessageRepository};

use crate::client::PostgresClient;
use crate::models::{message_from_row, MESSAGE_COLUMNS};

/// Read side of the message store. Message rows are written exclusively by
/// `PostgresBundleRepository::attach_message`.
#[derive(Clone)]
pub struct PostgresOutgoingMessageRepository {
    client: PostgresClient,
}

impl PostgresOutgoingMessageRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OutgoingMessageRepository for PostgresOutgoingMessageRepository {
    async fn list_by_bundle(&self, bundle_id: String) -> DomainResult<Vec<OutgoingMessage>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM outgoing_message
             WHERE assigned_bundle_id = $1
             ORDER BY bundle_position"
        );
        let rows = conn
            .query(query.as_str(), &[&bundle_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter().map(message_from_row).collect()
    }
}
