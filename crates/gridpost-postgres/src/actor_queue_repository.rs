use async_trait::async_trait;
use gridpost_domain::error::{DomainError, DomainResult};
use gridpost_domain::{ActorMessageQueue, ActorQueueRepository, Receiver};
use tracing::{debug, info};

use crate::client::PostgresClient;
use crate::models::queue_from_row;

#[derive(Clone)]
pub struct PostgresActorQueueRepository {
    client: PostgresClient,
}

impl PostgresActorQueueRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ActorQueueRepository for PostgresActorQueueRepository {
    async fn get_or_create(&self, receiver: Receiver) -> DomainResult<ActorMessageQueue> {
        debug!(receiver = %receiver, "get-or-create actor message queue");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // The unique constraint on (actor_number, actor_role) serializes
        // concurrent first-enqueues: at most one insert wins, everyone
        // reselects the same row.
        let candidate = ActorMessageQueue::new(receiver.clone());
        let inserted = conn
            .execute(
                "INSERT INTO actor_message_queue (queue_id, actor_number, actor_role, created_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (actor_number, actor_role) DO NOTHING",
                &[
                    &candidate.queue_id,
                    &candidate.receiver.actor_number.as_str(),
                    &candidate.receiver.role.as_str(),
                    &candidate.created_at,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        if inserted == 1 {
            info!(queue_id = %candidate.queue_id, receiver = %receiver, "actor message queue created");
        }

        let row = conn
            .query_one(
                "SELECT queue_id, actor_number, actor_role, created_at
                 FROM actor_message_queue
                 WHERE actor_number = $1 AND actor_role = $2",
                &[&receiver.actor_number.as_str(), &receiver.role.as_str()],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        queue_from_row(&row)
    }

    async fn find_by_receiver(
        &self,
        receiver: Receiver,
    ) -> DomainResult<Option<ActorMessageQueue>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                "SELECT queue_id, actor_number, actor_role, created_at
                 FROM actor_message_queue
                 WHERE actor_number = $1 AND actor_role = $2",
                &[&receiver.actor_number.as_str(), &receiver.role.as_str()],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.as_ref().map(queue_from_row).transpose()
    }
}
