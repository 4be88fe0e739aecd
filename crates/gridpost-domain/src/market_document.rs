use chrono::{DateTime, Utc};

use crate::types::DocumentFormat;

/// The one-time-rendered artifact for a closed bundle. Keyed by bundle id,
/// immutable after the first successful persist, deleted with the bundle on
/// dequeue.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDocument {
    pub bundle_id: String,
    pub format: DocumentFormat,
    pub payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// What an actor receives from a successful peek: the rendered byte stream
/// plus the identifier to echo back on dequeue.
#[derive(Debug, Clone, PartialEq)]
pub struct PeekedDocument {
    pub message_id: String,
    pub format: DocumentFormat,
    pub document: Vec<u8>,
}
