use gridpost_domain::{
    ActorMessageQueue, ActorNumber, ActorRole, Bundle, BusinessReason, DocumentFormat,
    DocumentType, GridArea, MarketActor, MarketDocument, MessageCategory, OutgoingMessage,
};
use gridpost_domain::error::DomainResult;
use tokio_postgres::Row;

pub(crate) const BUNDLE_COLUMNS: &str = "bundle_id, queue_id, peek_message_id, business_reason, \
     document_type, message_category, max_message_count, max_data_count, message_count, \
     data_count, related_to_message_id, created_at, closed_at";

pub(crate) const MESSAGE_COLUMNS: &str = "message_id, document_type, message_category, \
     receiver_number, receiver_role, sender_number, sender_role, business_reason, grid_area, \
     event_id, process_id, related_to_message_id, payload, data_point_count, created_at, \
     assigned_bundle_id";

pub(crate) fn queue_from_row(row: &Row) -> DomainResult<ActorMessageQueue> {
    Ok(ActorMessageQueue {
        queue_id: row.get(0),
        receiver: MarketActor {
            actor_number: ActorNumber::new(row.get::<_, String>(1))?,
            role: row.get::<_, String>(2).parse::<ActorRole>()?,
        },
        created_at: row.get(3),
    })
}

pub(crate) fn bundle_from_row(row: &Row) -> DomainResult<Bundle> {
    Ok(Bundle {
        bundle_id: row.get(0),
        queue_id: row.get(1),
        peek_message_id: row.get(2),
        business_reason: row.get::<_, String>(3).parse::<BusinessReason>()?,
        document_type: row.get::<_, String>(4).parse::<DocumentType>()?,
        message_category: row.get::<_, String>(5).parse::<MessageCategory>()?,
        max_message_count: row.get::<_, i32>(6) as u32,
        max_data_count: row.get::<_, Option<i32>>(7).map(|v| v as u32),
        message_count: row.get::<_, i32>(8) as u32,
        data_count: row.get::<_, i32>(9) as u32,
        related_to_message_id: row.get(10),
        created_at: row.get(11),
        closed_at: row.get(12),
    })
}

pub(crate) fn message_from_row(row: &Row) -> DomainResult<OutgoingMessage> {
    let grid_area: Option<String> = row.get(8);
    Ok(OutgoingMessage {
        message_id: row.get(0),
        document_type: row.get::<_, String>(1).parse::<DocumentType>()?,
        message_category: row.get::<_, String>(2).parse::<MessageCategory>()?,
        receiver: MarketActor {
            actor_number: ActorNumber::new(row.get::<_, String>(3))?,
            role: row.get::<_, String>(4).parse::<ActorRole>()?,
        },
        sender: MarketActor {
            actor_number: ActorNumber::new(row.get::<_, String>(5))?,
            role: row.get::<_, String>(6).parse::<ActorRole>()?,
        },
        business_reason: row.get::<_, String>(7).parse::<BusinessReason>()?,
        grid_area: grid_area.map(GridArea::new).transpose()?,
        event_id: row.get(9),
        process_id: row.get(10),
        related_to_message_id: row.get(11),
        payload: row.get(12),
        data_point_count: row.get::<_, i32>(13) as u32,
        created_at: row.get(14),
        assigned_bundle_id: row.get(15),
    })
}

pub(crate) fn document_from_row(row: &Row) -> DomainResult<MarketDocument> {
    Ok(MarketDocument {
        bundle_id: row.get(0),
        format: row.get::<_, String>(1).parse::<DocumentFormat>()?,
        payload: row.get(2),
        created_at: row.get(3),
    })
}
