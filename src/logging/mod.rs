//! Structured diagnostics through `tracing`.
//!
//! Router sinks are separate from this: sinks receive routed records, this
//! module only configures where the router's own diagnostics go.

pub mod config;
mod filters;
mod formatter;

pub use self::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),
    #[error("invalid log format '{0}', expected compact, pretty or json")]
    InvalidFormat(String),
    #[error("invalid filter directive '{directive}': {reason}")]
    InvalidDirective { directive: String, reason: String },
    #[error("global tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global subscriber: env filter plus a console layer.
pub fn init_logging(mut config: LoggingConfig) -> Result<(), LoggingError> {
    config.apply_env_overrides();
    config.validate()?;

    let env_filter = filters::build_filter_from_config(&config)?;
    let console = formatter::build_formatter_from_config::<Registry, _>(
        &config,
        std::io::stdout as fn() -> std::io::Stdout,
    )
    .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(console)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}
