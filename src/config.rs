use anyhow::Result;
use config::{Config, Environment};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::ai::AiClient;
use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://agencyops.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings, read from `.env` and the process environment.
///
/// Every field maps to the upper-cased environment variable of the same name,
/// e.g. `AI_API_KEY` or `CACHE_TTL_SECS`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub ai_api_key: Option<String>,
    pub ai_api_url: String,
    pub ai_model: String,
    pub admin_token: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Settings {
    /// Load settings with defaults for everything but the secrets.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("ai_api_url", crate::ai::DEFAULT_API_URL)?
            .set_default("ai_model", crate::ai::DEFAULT_MODEL)?
            .set_default("cache_ttl_secs", 300_i64)?
            .set_default("cache_capacity", 1000_i64)?
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;

        debug!(
            database_url = %settings.database_url,
            bind_address = %settings.bind_address,
            ai_enabled = settings.ai_api_key.is_some(),
            admin_enabled = settings.admin_token.is_some(),
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Replace the connection settings with values given on the command line.
    pub fn with_overrides(mut self, database_url: Option<&str>, bind_address: Option<&str>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url.to_string();
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address.to_string();
        }
        self
    }
}

/// Initialize application state from settings
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let cache = Cache::builder()
        .max_capacity(settings.cache_capacity)
        .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
        .build();

    let ai = match AiClient::from_settings(settings) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("AI insights disabled: {}", e);
            None
        }
    };

    if settings.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set, admin reports are disabled");
    }

    Ok(AppState {
        db,
        cache,
        ai,
        admin_token: settings.admin_token.clone(),
    })
}
