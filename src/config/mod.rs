use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub midtrans: MidtransConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub images_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    #[default]
    Sandbox,
    Production,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MidtransConfig {
    #[serde(default)]
    pub server_key: String,
    /// Handed to front-ends that embed Snap.js; the backend only needs the server key.
    #[serde(default)]
    pub client_key: String,
    #[serde(default)]
    pub environment: GatewayEnvironment,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("server.images_dir", "images")?
            .set_default("database.url", "sqlite://crowdfund.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("midtrans.environment", "sandbox")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Environment variables, e.g. CROWDFUND__MIDTRANS__SERVER_KEY
            .add_source(Environment::with_prefix("CROWDFUND").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
                images_dir: "images".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://crowdfund.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
            },
            midtrans: MidtransConfig::default(),
        }
    }
}
