use chrono::Duration;

use crate::types::MessageCategory;

/// Bundling knobs shared by the enqueue pipeline, the scheduler, and peek.
/// Passed into services at construction; never read from ambient state.
#[derive(Debug, Clone)]
pub struct BundlingConfig {
    /// Caps the number of messages a single bundle may hold.
    pub max_bundle_message_count: u32,
    /// Caps the total data points across a bundle's messages, independent of
    /// message count. Applies only to categories whose rendered size scales
    /// with contained data.
    pub max_bundle_data_count: u32,
    /// Max age of a partially-filled windowed bundle before the scheduler
    /// seals it anyway.
    pub bundle_messages_older_than: Duration,
    /// Whether the enqueue pipeline consults the delegation resolver.
    pub delegation_enabled: bool,
}

impl Default for BundlingConfig {
    fn default() -> Self {
        Self {
            max_bundle_message_count: 2_000,
            max_bundle_data_count: 10_000,
            bundle_messages_older_than: Duration::seconds(60),
            delegation_enabled: false,
        }
    }
}

/// Effective policy for one message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundlingPolicy {
    /// Windowed categories are sealed by the scheduler and never by peek;
    /// immediate categories are sealed on first peek.
    pub sealed_by_scheduler: bool,
    pub max_message_count: u32,
    pub max_data_count: Option<u32>,
}

impl BundlingConfig {
    pub fn policy_for(&self, category: MessageCategory) -> BundlingPolicy {
        match category {
            MessageCategory::MeasureData => BundlingPolicy {
                sealed_by_scheduler: true,
                max_message_count: self.max_bundle_message_count,
                max_data_count: Some(self.max_bundle_data_count),
            },
            MessageCategory::Aggregations | MessageCategory::MarketTransactions => {
                BundlingPolicy {
                    sealed_by_scheduler: false,
                    max_message_count: self.max_bundle_message_count,
                    max_data_count: None,
                }
            }
        }
    }

    /// Categories the bundling scheduler is responsible for sealing.
    pub fn scheduled_categories(&self) -> Vec<MessageCategory> {
        MessageCategory::ALL
            .into_iter()
            .filter(|category| self.policy_for(*category).sealed_by_scheduler)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_data_is_windowed_with_data_cap() {
        let config = BundlingConfig::default();
        let policy = config.policy_for(MessageCategory::MeasureData);
        assert!(policy.sealed_by_scheduler);
        assert_eq!(policy.max_data_count, Some(10_000));
    }

    #[test]
    fn aggregations_are_sealed_at_peek() {
        let config = BundlingConfig::default();
        let policy = config.policy_for(MessageCategory::Aggregations);
        assert!(!policy.sealed_by_scheduler);
        assert_eq!(policy.max_data_count, None);
    }

    #[test]
    fn only_measure_data_is_scheduler_owned() {
        let config = BundlingConfig::default();
        assert_eq!(
            config.scheduled_categories(),
            vec![MessageCategory::MeasureData]
        );
    }
}
