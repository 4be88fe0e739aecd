use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Interval between bundling scheduler passes in seconds
    #[serde(default = "default_bundling_interval_secs")]
    pub bundling_interval_secs: u64,

    // Bundling configuration
    /// Max messages per bundle
    #[serde(default = "default_max_bundle_message_count")]
    pub max_bundle_message_count: u32,

    /// Max data points per bundle for data-capped categories
    #[serde(default = "default_max_bundle_data_count")]
    pub max_bundle_data_count: u32,

    /// Age in seconds after which a windowed bundle is sealed
    #[serde(default = "default_bundle_messages_older_than_secs")]
    pub bundle_messages_older_than_secs: u64,

    /// Whether enqueue consults the delegation register
    #[serde(default)]
    pub delegation_enabled: bool,

    // PostgreSQL configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bundling_interval_secs() -> u64 {
    10
}

fn default_max_bundle_message_count() -> u32 {
    2_000
}

fn default_max_bundle_data_count() -> u32 {
    10_000
}

fn default_bundle_messages_older_than_secs() -> u64 {
    60
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "gridpost".to_string()
}

fn default_postgres_username() -> String {
    "gridpost".to_string()
}

fn default_postgres_password() -> String {
    "gridpost".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    16
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("GRIDPOST"))
            .build()?
            .try_deserialize()
    }
}
