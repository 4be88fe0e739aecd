use chrono::{DateTime, Utc};

use crate::types::Receiver;

/// Per-receiver container owning the bundles addressed to that receiver.
/// Created lazily on first enqueue and never deleted, so a receiver stays
/// addressable even when its queue is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorMessageQueue {
    pub queue_id: String,
    pub receiver: Receiver,
    pub created_at: DateTime<Utc>,
}

impl ActorMessageQueue {
    pub fn new(receiver: Receiver) -> Self {
        Self {
            queue_id: xid::new().to_string(),
            receiver,
            created_at: Utc::now(),
        }
    }
}
