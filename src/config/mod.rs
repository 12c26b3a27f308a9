use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_token_expiry_secs: i64,
    /// Per-evaluation budget for a single regex match, in milliseconds.
    pub match_timeout_ms: u64,
    /// Maximum number of bulk-extraction items processed concurrently.
    pub bulk_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_token_expiry_secs: env::var("JWT_TOKEN_EXPIRY_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
            match_timeout_ms: env::var("MATCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .unwrap_or(250),
            bulk_concurrency: env::var("BULK_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
        })
    }
}
