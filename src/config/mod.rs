use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeaderboardConfig {
    /// How long an unfiltered leaderboard stays in the process cache.
    pub cache_ttl_seconds: u64,
    /// Push interval for streaming listeners.
    pub stream_interval_seconds: u64,
    /// Number of entries pushed to streaming listeners.
    pub stream_top_n: usize,
    /// Interval between persisted rank snapshots.
    pub snapshot_interval_minutes: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 30,
            stream_interval_seconds: 10,
            stream_top_n: 10,
            snapshot_interval_minutes: 1440,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite://nird.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.jwt_secret", "change-me-in-production")?
            .set_default("auth.token_duration_hours", 24)?
            .set_default("leaderboard.cache_ttl_seconds", 30)?
            .set_default("leaderboard.stream_interval_seconds", 10)?
            .set_default("leaderboard.stream_top_n", 10)?
            .set_default("leaderboard.snapshot_interval_minutes", 1440)?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with NIRD__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("NIRD").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: "sqlite://nird.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_duration_hours: 24,
            },
            leaderboard: LeaderboardConfig::default(),
        }
    }
}
