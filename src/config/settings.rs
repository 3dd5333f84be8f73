use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tidings_error::{RouterError, RouterResult};

use crate::router::DEFAULT_PREFIX;

/// Prefix of environment variables read by [`RouterConfig::load`].
pub const ENV_PREFIX: &str = "TIDINGS";

/// Router construction options that are plain data.
///
/// Sinks, the translator and extra annotation steps are injected through
/// [`crate::RouterBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Strict mode: fail publishes to topics without subscribers.
    #[serde(default)]
    pub raise_on_dead: bool,
    /// Prefix of reserved message keys.
    #[serde(default = "default_prefix")]
    pub annotation_prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            raise_on_dead: false,
            annotation_prefix: default_prefix(),
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by `TIDINGS_*` environment variables.
    pub fn load() -> RouterResult<Self> {
        Self::build(None)
    }

    /// Like [`RouterConfig::load`], with an optional config file layered
    /// between the defaults and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> RouterResult<Self> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> RouterResult<Self> {
        let cfg = Self::builder(path).map_err(config_error)?;
        let settings: Self = cfg.try_deserialize().map_err(config_error)?;
        settings.validate()?;
        Ok(settings)
    }

    fn builder(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut builder = Config::builder()
            // Adding default values
            .set_default("raise_on_dead", false)?
            .set_default("annotation_prefix", DEFAULT_PREFIX)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            // Add environment variables with the TIDINGS_ prefix
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
    }

    /// Rejects an empty prefix or one containing whitespace.
    pub fn validate(&self) -> RouterResult<()> {
        if self.annotation_prefix.is_empty() {
            return Err(RouterError::Config {
                reason: "annotation_prefix must not be empty".to_string(),
            });
        }
        if self.annotation_prefix.chars().any(char::is_whitespace) {
            return Err(RouterError::Config {
                reason: format!(
                    "annotation_prefix {:?} must not contain whitespace",
                    self.annotation_prefix
                ),
            });
        }
        Ok(())
    }
}

fn config_error(err: ConfigError) -> RouterError {
    RouterError::Config {
        reason: err.to_string(),
    }
}
