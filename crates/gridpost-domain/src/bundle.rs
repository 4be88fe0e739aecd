use chrono::{DateTime, Utc};

use crate::policy::BundlingPolicy;
use crate::types::{BusinessReason, DocumentType, MessageCategory};

/// The grouping key messages are bundled under. Messages with identical keys
/// for the same queue share a bundle until it is sealed or full.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleKey {
    pub queue_id: String,
    pub business_reason: BusinessReason,
    pub document_type: DocumentType,
    pub message_category: MessageCategory,
}

/// An ordered, capacity-bounded group of messages for one receiver.
///
/// Lifecycle: created when the first message for a key needs a home; closed
/// by the scheduler (windowed categories), by peek (immediate categories), or
/// by the enqueuer when it finds the bundle full; deleted with its messages
/// and document on dequeue. Once closed a bundle never accepts messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub bundle_id: String,
    pub queue_id: String,
    /// Stable identifier returned by peek and echoed back on dequeue.
    pub peek_message_id: String,
    pub business_reason: BusinessReason,
    pub document_type: DocumentType,
    pub message_category: MessageCategory,
    pub max_message_count: u32,
    pub max_data_count: Option<u32>,
    pub message_count: u32,
    pub data_count: u32,
    pub related_to_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Bundle {
    pub fn new(
        key: BundleKey,
        policy: &BundlingPolicy,
        related_to_message_id: Option<String>,
    ) -> Self {
        Self {
            bundle_id: xid::new().to_string(),
            queue_id: key.queue_id,
            peek_message_id: xid::new().to_string(),
            business_reason: key.business_reason,
            document_type: key.document_type,
            message_category: key.message_category,
            max_message_count: policy.max_message_count,
            max_data_count: policy.max_data_count,
            message_count: 0,
            data_count: 0,
            related_to_message_id,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn key(&self) -> BundleKey {
        BundleKey {
            queue_id: self.queue_id.clone(),
            business_reason: self.business_reason,
            document_type: self.document_type,
            message_category: self.message_category,
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Whether a message carrying `data_points` fits under both caps while
    /// the bundle is still open.
    pub fn can_accept(&self, data_points: u32) -> bool {
        if !self.is_open() || self.message_count >= self.max_message_count {
            return false;
        }
        match self.max_data_count {
            Some(max) => self.data_count + data_points <= max,
            None => true,
        }
    }

    /// Whether either cap has been reached.
    pub fn is_full(&self) -> bool {
        if self.message_count >= self.max_message_count {
            return true;
        }
        matches!(self.max_data_count, Some(max) if self.data_count >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::BundlingConfig;

    fn key() -> BundleKey {
        BundleKey {
            queue_id: "queue-1".to_string(),
            business_reason: BusinessReason::PeriodicMetering,
            document_type: DocumentType::NotifyValidatedMeasureData,
            message_category: MessageCategory::MeasureData,
        }
    }

    fn measure_data_bundle() -> Bundle {
        let config = BundlingConfig {
            max_bundle_message_count: 3,
            max_bundle_data_count: 10,
            ..BundlingConfig::default()
        };
        Bundle::new(
            key(),
            &config.policy_for(MessageCategory::MeasureData),
            None,
        )
    }

    #[test]
    fn fresh_bundle_accepts_messages() {
        let bundle = measure_data_bundle();
        assert!(bundle.is_open());
        assert!(bundle.can_accept(5));
        assert!(!bundle.is_full());
    }

    #[test]
    fn message_count_cap_is_enforced() {
        let mut bundle = measure_data_bundle();
        bundle.message_count = 3;
        assert!(!bundle.can_accept(1));
        assert!(bundle.is_full());
    }

    #[test]
    fn data_cap_is_enforced_independently_of_message_count() {
        let mut bundle = measure_data_bundle();
        bundle.message_count = 1;
        bundle.data_count = 8;
        assert!(bundle.can_accept(2));
        assert!(!bundle.can_accept(3));
    }

    #[test]
    fn closed_bundle_accepts_nothing() {
        let mut bundle = measure_data_bundle();
        bundle.closed_at = Some(Utc::now());
        assert!(!bundle.can_accept(1));
    }

    #[test]
    fn immediate_category_has_no_data_cap() {
        let config = BundlingConfig::default();
        let bundle = Bundle::new(
            BundleKey {
                message_category: MessageCategory::Aggregations,
                document_type: DocumentType::NotifyAggregatedMeasureData,
                ..key()
            },
            &config.policy_for(MessageCategory::Aggregations),
            None,
        );
        assert!(bundle.can_accept(1_000_000));
    }
}
