use std::{collections::BTreeMap, env, str::FromStr};

use serde::{Deserialize, Serialize};

use super::LoggingError;

/// Формат консольного вывода.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggingError::InvalidFormat(other.to_string())),
        }
    }
}

/// Конфигурация логирования.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Базовый уровень (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub with_ansi: bool,
    #[serde(default = "default_true")]
    pub with_target: bool,
    #[serde(default)]
    pub with_thread_ids: bool,
    #[serde(default)]
    pub with_line_numbers: bool,
    /// Уровни для отдельных target, например `tidings::sink = "warn"`.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_line_numbers: false,
            targets: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Применяет `TIDINGS_LOG_LEVEL` и `TIDINGS_LOG_FORMAT`, если заданы.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var("TIDINGS_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("TIDINGS_LOG_FORMAT") {
            match format.parse() {
                Ok(f) => self.format = f,
                Err(e) => eprintln!("Ignoring TIDINGS_LOG_FORMAT: {e}"),
            }
        }
    }

    /// Проверяет базовый уровень и уровни target.
    pub fn validate(&self) -> Result<(), LoggingError> {
        validate_level(&self.level)?;
        for level in self.targets.values() {
            validate_level(level)?;
        }
        Ok(())
    }

    /// Директива для `EnvFilter`: `info,tidings::sink=warn`.
    pub fn build_filter_directive(&self) -> String {
        let mut directive = self.level.to_ascii_lowercase();
        for (target, level) in &self.targets {
            directive.push(',');
            directive.push_str(target);
            directive.push('=');
            directive.push_str(&level.to_ascii_lowercase());
        }
        directive
    }
}

fn validate_level(level: &str) -> Result<(), LoggingError> {
    tracing::Level::from_str(level)
        .map(|_| ())
        .map_err(|_| LoggingError::InvalidLevel(level.to_string()))
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
