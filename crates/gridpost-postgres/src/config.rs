/// Connection settings for the PostgreSQL store.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub max_pool_size: usize,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "gridpost".to_string(),
            username: "gridpost".to_string(),
            password: "gridpost".to_string(),
            max_pool_size: 16,
        }
    }
}
