use std::fmt;

use thiserror::Error;

/// Ошибка, которую подписчик возвращает из `deliver`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct DeliveryError {
    pub reason: String,
}

impl DeliveryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Неудачная доставка одному подписчику во время fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Строка идентичности подписчика.
    pub subscriber: String,
    pub error: DeliveryError,
}

impl fmt::Display for DeliveryFailure {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.subscriber, self.error)
    }
}
