//! Model configuration files.

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tollgate_core::ModelConfig;
use tollgate_error::{ConfigError, TollgateError, TollgateResult};
use tracing::{debug, instrument};

/// Named model configurations.
///
/// # Example
///
/// ```toml
/// [models.default_chat]
/// model = "gpt-4o-mini"
/// requests_per_minute = 500
/// tokens_per_minute = 200_000
/// retry_strategy = "exponential_backoff"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Model configurations by logical name
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

impl TollgateConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> TollgateResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                TollgateError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TollgateError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Sources, later overriding earlier:
    /// 1. Bundled defaults (`tollgate.toml` shipped with the crate)
    /// 2. `~/.config/tollgate/tollgate.toml`
    /// 3. `./tollgate.toml`
    ///
    /// Missing user files are skipped.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tollgate::TollgateConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = TollgateConfig::load()?;
    /// let chat = config.model("default_chat")?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> TollgateResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../tollgate.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tollgate/tollgate.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("tollgate").required(false));

        builder
            .build()
            .map_err(|e| {
                TollgateError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TollgateError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Configuration of one logical model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no model is configured under `name`.
    pub fn model(&self, name: &str) -> TollgateResult<&ModelConfig> {
        self.models.get(name).ok_or_else(|| {
            ConfigError::new(format!("No model configured under '{}'", name)).into()
        })
    }

    /// Configured logical model names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}
