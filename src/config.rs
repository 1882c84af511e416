use config::{Config, ConfigError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    pub root: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub session: SessionSettings,
}

impl Settings {
    /// Reads `appsettings.toml`, then `USADOS__*` environment overrides
    /// (e.g. `USADOS__DATABASE__URL`).
    pub fn load() -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(config::File::with_name("appsettings"))
            .add_source(config::Environment::with_prefix("USADOS").separator("__"))
            .build()?
            .try_deserialize()
    }
}

fn default_pool_size() -> u32 {
    10
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_ttl_hours() -> i64 {
    24
}
