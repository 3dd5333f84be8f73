use std::any::Any;

use thiserror::Error;

use crate::{DeliveryFailure, ErrorExt, StatusCode};

/// Ошибки операций маршрутизатора.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Кандидат не умеет принимать сообщения; подписка не записана.
    #[error("subscriber {subscriber} does not accept messages")]
    InvalidSubscriber { subscriber: String },

    /// Строгий режим: у темы нет подписчиков.
    #[error("dead message: no subscribers for topic '{topic}'")]
    DeadMessage { topic: String },

    /// Ключ сообщения использует зарезервированный префикс.
    #[error("message key '{key}' collides with the reserved prefix")]
    ReservedKey { key: String },

    /// Тема лежит в зарезервированном пространстве имён.
    #[error("topic '{topic}' is inside the reserved namespace")]
    ReservedTopic { topic: String },

    /// В сообщении нет строкового значения под ключом темы.
    #[error("message has no string topic under '{key}'")]
    MissingTopic { key: String },

    /// Часть подписчиков вернула ошибку во время fan-out.
    #[error(
        "{} of {attempted} deliveries to '{topic}' failed",
        .failures.len()
    )]
    DeliveryFailed {
        topic: String,
        attempted: usize,
        failures: Vec<DeliveryFailure>,
    },

    /// Некорректная конфигурация маршрутизатора.
    #[error("invalid router configuration: {reason}")]
    Config { reason: String },

    /// Фоновая задача сервиса маршрутизатора остановлена.
    #[error("router service is stopped")]
    ServiceStopped,
}

impl RouterError {
    /// Тема, к которой относится ошибка, если она есть.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::DeadMessage { topic }
            | Self::ReservedTopic { topic }
            | Self::DeliveryFailed { topic, .. } => Some(topic),
            _ => None,
        }
    }
}

impl ErrorExt for RouterError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSubscriber { .. } => StatusCode::InvalidSubscriber,
            Self::DeadMessage { .. } => StatusCode::DeadLetter,
            Self::ReservedKey { .. } | Self::ReservedTopic { .. } => StatusCode::ReservedKey,
            Self::MissingTopic { .. } => StatusCode::MissingTopic,
            Self::DeliveryFailed { .. } => StatusCode::DeliveryFailed,
            Self::Config { .. } => StatusCode::ConfigInvalid,
            Self::ServiceStopped => StatusCode::ServiceStopped,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", "router".to_string()),
            ("status_code", self.status_code().to_string()),
        ];

        match self {
            Self::DeadMessage { topic } | Self::ReservedTopic { topic } => {
                tags.push(("topic", topic.clone()));
            }
            Self::DeliveryFailed {
                topic, failures, ..
            } => {
                tags.push(("topic", topic.clone()));
                tags.push(("failed", failures.len().to_string()));
            }
            Self::ReservedKey { key } | Self::MissingTopic { key } => {
                tags.push(("key", key.clone()));
            }
            _ => {}
        }

        tags
    }
}
