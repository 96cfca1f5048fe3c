use std::{path::PathBuf, sync::OnceLock};

use config::{Config, Environment, File};
use thiserror::Error;

use crate::move_gen::magic::MagicSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The configuration has already been initialized")]
    ConfigAlreadyInitialized,

    #[error("Unable to read the configuration: {0}")]
    UnableToReadConfig(#[from] config::ConfigError),
}

/// Configuration of the move generator and perft driver
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct FerriteConfig {
    /// Deepest perft accepted before reporting a depth limit
    pub perft_max_depth: u32,

    /// Seed of the generator used by the magic multiplier search
    pub magic_seed: u64,

    /// Number of candidate multipliers tried per square before the search gives up
    pub magic_max_attempts: u64,
}

impl Default for FerriteConfig {
    fn default() -> Self {
        let magic = MagicSettings::default();
        FerriteConfig { perft_max_depth: 32, magic_seed: magic.seed, magic_max_attempts: magic.max_attempts }
    }
}

impl FerriteConfig {
    /// Returns the parameters of the magic multiplier search.
    pub fn magic_settings(&self) -> MagicSettings {
        MagicSettings { seed: self.magic_seed, max_attempts: self.magic_max_attempts }
    }
}

static CONFIG: OnceLock<FerriteConfig> = OnceLock::new();

/// Get the configuration, or the defaults when `initialize` was never called
pub fn get_config() -> &'static FerriteConfig {
    CONFIG.get_or_init(FerriteConfig::default)
}

/// Reads the optional file then the `FERRITE_*` environment variables over the defaults.
fn load(path: Option<PathBuf>) -> Result<FerriteConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    let settings = builder.add_source(Environment::with_prefix("FERRITE").try_parsing(true)).build()?;

    Ok(settings.try_deserialize()?)
}

/// Initialize the configuration. Must be called before the first `get_config`.
pub fn initialize(path: Option<PathBuf>) -> Result<(), ConfigError> {
    let config = load(path)?;
    CONFIG.set(config).map_err(|_| ConfigError::ConfigAlreadyInitialized)
}
