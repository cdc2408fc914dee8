//! Configuration loading with environment awareness.
//!
//! Sources are layered lowest-precedence first: compiled defaults,
//! `config/default.toml`, `config/{environment}.toml`, then
//! `STOREFRONT_`-prefixed environment variables
//! (e.g. `STOREFRONT_DATABASE__HOST`).

use config::{Config, Environment, File};
use tracing::info;

use super::{ConfigurationError, StorefrontConfig};

/// Loads and owns the process configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: StorefrontConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration for the auto-detected environment
    pub fn load() -> Result<Self, ConfigurationError> {
        let environment = detect_environment();
        Self::load_for_environment(&environment)
    }

    /// Load configuration for an explicit environment
    pub fn load_for_environment(environment: &str) -> Result<Self, ConfigurationError> {
        let defaults = StorefrontConfig::default();

        let config: StorefrontConfig = Config::builder()
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("STOREFRONT").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = %environment,
            database_host = %config.database.host,
            cache_host = %config.cache.host,
            "Configuration loaded"
        );

        Ok(Self {
            config,
            environment: environment.to_string(),
        })
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}

fn detect_environment() -> String {
    std::env::var("STOREFRONT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}
