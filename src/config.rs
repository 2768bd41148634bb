use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AppError;

/// Prefix of every environment variable read by [`AppConfig::load`].
pub const ENV_PREFIX: &str = "POSTDESK";

/// Whether the process talks to the live search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Production,
    Development,
}

impl ExecutionMode {
    /// `production` selects [`ExecutionMode::Production`]; any other value
    /// (including typos) falls back to development.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" => ExecutionMode::Production,
            _ => ExecutionMode::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, ExecutionMode::Production)
    }
}

/// Runtime configuration.
///
/// Layered as: built-in defaults, then an optional config file, then
/// `POSTDESK_*` environment variables (e.g. `POSTDESK_MONGODB_URI`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Raw execution mode; see [`AppConfig::mode`].
    pub env: String,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub meili_url: String,
    #[serde(default)]
    pub meili_api_key: Option<String>,
    pub meili_index: String,
    /// Public site base; index records link to `{site_url}/{slug}`.
    pub site_url: String,
    /// Base for cover images; index records link to `{image_base_url}/{path}.webp`.
    pub image_base_url: String,
    pub bind_addr: String,
}

impl AppConfig {
    /// Load configuration from defaults, an optional file and the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self, AppError> {
        Self::load_with(file, Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`AppConfig::load`] with an explicit environment source.
    pub fn load_with(file: Option<&Path>, env: Environment) -> Result<Self, AppError> {
        let mut builder = Config::builder()
            .set_default("env", "development")?
            .set_default("mongodb_uri", "mongodb://localhost:27017")?
            .set_default("mongodb_database", "postdesk")?
            .set_default("meili_url", "http://localhost:7700")?
            .set_default("meili_index", "posts")?
            .set_default("site_url", "http://localhost:3000/posts")?
            .set_default("image_base_url", "http://localhost:3000/images")?
            .set_default("bind_addr", "127.0.0.1:3000")?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: AppConfig = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn mode(&self) -> ExecutionMode {
        ExecutionMode::from_env_value(&self.env)
    }

    fn validate(&self) -> Result<(), AppError> {
        url::Url::parse(&self.site_url)
            .map_err(|e| AppError::Config(format!("Invalid site_url '{}': {e}", self.site_url)))?;
        url::Url::parse(&self.image_base_url).map_err(|e| {
            AppError::Config(format!(
                "Invalid image_base_url '{}': {e}",
                self.image_base_url
            ))
        })?;
        if self.meili_index.trim().is_empty() {
            return Err(AppError::Config("meili_index cannot be empty".into()));
        }
        Ok(())
    }
}
