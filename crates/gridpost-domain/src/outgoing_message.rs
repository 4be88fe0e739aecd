use chrono::{DateTime, Utc};

use crate::types::{
    BusinessReason, DocumentType, GridArea, MarketActor, MessageCategory, Receiver, Sender,
};

/// One document to deliver to one receiver. Immutable after creation except
/// for the single bundle assignment; removed together with its bundle on
/// dequeue.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub message_id: String,
    pub document_type: DocumentType,
    pub message_category: MessageCategory,
    pub receiver: Receiver,
    pub sender: Sender,
    pub business_reason: BusinessReason,
    pub grid_area: Option<GridArea>,
    pub event_id: String,
    pub process_id: Option<String>,
    pub related_to_message_id: Option<String>,
    /// Serialized business payload, opaque to this layer.
    pub payload: String,
    /// Counts against a bundle's data cap; 0 for categories without one.
    pub data_point_count: u32,
    pub created_at: DateTime<Utc>,
    pub assigned_bundle_id: Option<String>,
}

/// Enqueue request from an upstream business process.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueMessageInput {
    pub document_type: DocumentType,
    pub message_category: MessageCategory,
    pub receiver: Receiver,
    pub sender: Sender,
    pub business_reason: BusinessReason,
    pub grid_area: Option<GridArea>,
    pub event_id: String,
    pub process_id: Option<String>,
    pub related_to_message_id: Option<String>,
    pub payload: String,
    pub data_point_count: u32,
}

impl OutgoingMessage {
    /// Builds the persistable message from an enqueue input and the receiver
    /// the delegation step resolved to.
    pub fn from_input(input: EnqueueMessageInput, receiver: MarketActor) -> Self {
        Self {
            message_id: xid::new().to_string(),
            document_type: input.document_type,
            message_category: input.message_category,
            receiver,
            sender: input.sender,
            business_reason: input.business_reason,
            grid_area: input.grid_area,
            event_id: input.event_id,
            process_id: input.process_id,
            related_to_message_id: input.related_to_message_id,
            payload: input.payload,
            data_point_count: input.data_point_count,
            created_at: Utc::now(),
            assigned_bundle_id: None,
        }
    }
}
