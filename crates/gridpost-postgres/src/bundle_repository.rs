use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridpost_domain::error::{DomainError, DomainResult};
use gridpost_domain::{Bundle, BundleKey, BundleRepository, MessageCategory, OutgoingMessage};
use tracing::{debug, info};

use crate::client::PostgresClient;
use crate::models::{bundle_from_row, BUNDLE_COLUMNS};

#[derive(Clone)]
pub struct PostgresBundleRepository {
    client: PostgresClient,
}

impl PostgresBundleRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BundleRepository for PostgresBundleRepository {
    async fn create(&self, bundle: Bundle) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let result = conn
            .execute(
                "INSERT INTO bundle (bundle_id, queue_id, peek_message_id, business_reason, \
                 document_type, message_category, max_message_count, max_data_count, \
                 message_count, data_count, related_to_message_id, created_at, closed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
                &[
                    &bundle.bundle_id,
                    &bundle.queue_id,
                    &bundle.peek_message_id,
                    &bundle.business_reason.as_str(),
                    &bundle.document_type.as_str(),
                    &bundle.message_category.as_str(),
                    &(bundle.max_message_count as i32),
                    &bundle.max_data_count.map(|v| v as i32),
                    &(bundle.message_count as i32),
                    &(bundle.data_count as i32),
                    &bundle.related_to_message_id,
                    &bundle.created_at,
                    &bundle.closed_at,
                ],
            )
            .await;

        if let Err(e) = result {
            // The partial unique index on open bundles turns a lost
            // create race into a unique violation.
            if let Some(db_err) = e.as_db_error() {
                if db_err.code().code() == "23505" {
                    return Err(DomainError::BundleAlreadyOpen(format!(
                        "{}/{}/{}/{}",
                        bundle.queue_id,
                        bundle.business_reason,
                        bundle.document_type,
                        bundle.message_category
                    )));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        info!(bundle_id = %bundle.bundle_id, queue_id = %bundle.queue_id, "bundle persisted");
        Ok(())
    }

    async fn find_open(&self, key: BundleKey) -> DomainResult<Option<Bundle>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {BUNDLE_COLUMNS} FROM bundle
             WHERE queue_id = $1 AND business_reason = $2 AND document_type = $3
               AND message_category = $4 AND closed_at IS NULL"
        );
        let row = conn
            .query_opt(
                query.as_str(),
                &[
                    &key.queue_id,
                    &key.business_reason.as_str(),
                    &key.document_type.as_str(),
                    &key.message_category.as_str(),
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(bundle_from_row).transpose()
    }

    async fn attach_message(
        &self,
        bundle_id: String,
        message: OutgoingMessage,
    ) -> DomainResult<bool> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        // The conditional update re-checks openness and both caps on the
        // current row version, so it serializes against a concurrent seal.
        let row = tx
            .query_opt(
                "UPDATE bundle
                 SET message_count = message_count + 1, data_count = data_count + $2
                 WHERE bundle_id = $1
                   AND closed_at IS NULL
                   AND message_count < max_message_count
                   AND (max_data_count IS NULL OR data_count + $2 <= max_data_count)
                 RETURNING message_count",
                &[&bundle_id, &(message.data_point_count as i32)],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| DomainError::RepositoryError(e.into()))?;
            debug!(bundle_id = %bundle_id, "bundle closed or at capacity, attach refused");
            return Ok(false);
        };
        let position: i32 = row.get(0);

        // The message row lives in the same transaction as the slot
        // reservation; a refused or failed attach persists nothing.
        tx.execute(
            "INSERT INTO outgoing_message (message_id, document_type, message_category, \
             receiver_number, receiver_role, sender_number, sender_role, business_reason, \
             grid_area, event_id, process_id, related_to_message_id, payload, \
             data_point_count, created_at, assigned_bundle_id, bundle_position)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
            &[
                &message.message_id,
                &message.document_type.as_str(),
                &message.message_category.as_str(),
                &message.receiver.actor_number.as_str(),
                &message.receiver.role.as_str(),
                &message.sender.actor_number.as_str(),
                &message.sender.role.as_str(),
                &message.business_reason.as_str(),
                &message.grid_area.as_ref().map(|g| g.as_str()),
                &message.event_id,
                &message.process_id,
                &message.related_to_message_id,
                &message.payload,
                &(message.data_point_count as i32),
                &message.created_at,
                &bundle_id,
                &position,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;
        Ok(true)
    }

    async fn close(&self, bundle_id: String, closed_at: DateTime<Utc>) -> DomainResult<bool> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let updated = conn
            .execute(
                "UPDATE bundle SET closed_at = $2
                 WHERE bundle_id = $1 AND closed_at IS NULL",
                &[&bundle_id, &closed_at],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(updated == 1)
    }

    async fn oldest_peekable(
        &self,
        queue_id: String,
        category: MessageCategory,
        require_closed: bool,
    ) -> DomainResult<Option<Bundle>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let closed_clause = if require_closed {
            "AND closed_at IS NOT NULL"
        } else {
            ""
        };
        let query = format!(
            "SELECT {BUNDLE_COLUMNS} FROM bundle
             WHERE queue_id = $1 AND message_category = $2 {closed_clause}
             ORDER BY created_at, bundle_id
             LIMIT 1"
        );
        let row = conn
            .query_opt(query.as_str(), &[&queue_id, &category.as_str()])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(bundle_from_row).transpose()
    }

    async fn list_open(&self, category: MessageCategory) -> DomainResult<Vec<Bundle>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {BUNDLE_COLUMNS} FROM bundle
             WHERE message_category = $1 AND closed_at IS NULL
             ORDER BY created_at"
        );
        let rows = conn
            .query(query.as_str(), &[&category.as_str()])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter().map(bundle_from_row).collect()
    }

    async fn find_closed_by_peek_message_id(
        &self,
        peek_message_id: String,
    ) -> DomainResult<Option<Bundle>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let query = format!(
            "SELECT {BUNDLE_COLUMNS} FROM bundle
             WHERE peek_message_id = $1 AND closed_at IS NOT NULL"
        );
        let row = conn
            .query_opt(query.as_str(), &[&peek_message_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(bundle_from_row).transpose()
    }

    async fn remove(&self, bundle_id: String) -> DomainResult<bool> {
        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.execute(
            "DELETE FROM market_document WHERE bundle_id = $1",
            &[&bundle_id],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let messages = tx
            .execute(
                "DELETE FROM outgoing_message WHERE assigned_bundle_id = $1",
                &[&bundle_id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        let deleted = tx
            .execute("DELETE FROM bundle WHERE bundle_id = $1", &[&bundle_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if deleted == 1 {
            info!(bundle_id = %bundle_id, messages, "bundle removed with its messages and document");
        } else {
            debug!(bundle_id = %bundle_id, "bundle was already removed");
        }
        Ok(deleted == 1)
    }
}
