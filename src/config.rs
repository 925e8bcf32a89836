// Configuration loading
// Layers: built-in defaults, optional config.toml, APP__* environment variables, PORT

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const DEVELOPMENT_API_URL: &str = "http://localhost:3138";
const PRODUCTION_API_URL: &str = "https://api.autoyard.eu";

// Process-wide deployment flag; picks the remote API endpoint
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    Development,
    #[default]
    Production,
}

impl RuntimeEnvironment {
    pub fn api_base_url(self) -> &'static str {
        match self {
            RuntimeEnvironment::Development => DEVELOPMENT_API_URL,
            RuntimeEnvironment::Production => PRODUCTION_API_URL,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub resource: String,    // Listing resource path segment, e.g. "theparking-eu"
    pub order_field: String, // Ingestion timestamp field used for sorting
    pub page_size: u32,
    // Only the catalog calls use timeout/retry
    pub catalog_timeout_ms: u64,
    pub catalog_retries: u32,
    pub catalog_retry_delay_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            resource: "theparking-eu".to_string(),
            order_field: "crawled_at".to_string(),
            page_size: 100,
            catalog_timeout_ms: 8_000,
            catalog_retries: 3,
            catalog_retry_delay_ms: 5_500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub namespace: String, // Prefix of every per-user storage key
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AcceptEncoding {
    Gzip,
    Deflate,
    #[serde(alias = "")]
    None,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub static_dir: String,
    pub index_file: String,
    // Regex over the request path -> directory under static_dir
    #[serde(default)]
    pub url_rewrite: HashMap<String, String>,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64, // 0 = never time out
    pub accept_encoding: AcceptEncoding,
    #[serde(default = "default_response_headers")]
    pub headers: BTreeMap<String, String>,
}

fn default_response_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            "Origin, Content-Type, Accept, Authorization".to_string(),
        ),
        ("Access-Control-Allow-Methods".to_string(), "OPTIONS, GET".to_string()),
        ("Access-Control-Max-Age".to_string(), "3600".to_string()),
    ])
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: RuntimeEnvironment,
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let builder = Self::defaults(Config::builder())?
            .add_source(File::with_name("config").required(false))
            // e.g. APP_ENVIRONMENT=development, APP_SERVER__PORT=8080
            .add_source(Environment::with_prefix("APP").prefix_separator("_").separator("__"))
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        let settings = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        Ok(settings)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let api = ApiSettings::default();
        let builder = builder
            .set_default("environment", "production")?
            .set_default("api.resource", api.resource)?
            .set_default("api.order_field", api.order_field)?
            .set_default("api.page_size", api.page_size)?
            .set_default("api.catalog_timeout_ms", api.catalog_timeout_ms)?
            .set_default("api.catalog_retries", api.catalog_retries)?
            .set_default("api.catalog_retry_delay_ms", api.catalog_retry_delay_ms)?
            .set_default("storage.namespace", "autoyard")?
            .set_default("storage.data_dir", "data")?
            .set_default("server.static_dir", "dist")?
            .set_default("server.index_file", "index.html")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3238)?
            .set_default("server.timeout_secs", 5 * 60)?
            .set_default("server.accept_encoding", "gzip")?;
        Ok(builder)
    }

    pub fn api_base_url(&self) -> &'static str {
        self.environment.api_base_url()
    }
}
