use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Коды статуса для категоризации ошибок маршрутизатора.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Внутренние ошибки
/// - 2xxx: Ошибки данных (сообщения, ключи)
/// - 3xxx: Подписки
/// - 4xxx: Доставка
/// - 5xxx: Конфигурация и жизненный цикл
///
/// # Реализация:
/// - `num_enum::TryFromPrimitive` даёт нативную реализацию `TryFrom<u32>`.
/// - опционально: `strum` для `AsRefStr`/`EnumIter` (feature = "strum").
/// - опционально: `serde_repr` для сериализации в виде числового значения
///   (feature = "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Внутренние ошибки ===
    Internal = 1000,

    // === 2xxx: Ошибки данных ===
    ReservedKey = 2010,
    MissingTopic = 2011,

    // === 3xxx: Подписки ===
    InvalidSubscriber = 3000,

    // === 4xxx: Доставка ===
    DeadLetter = 4000,
    DeliveryFailed = 4001,

    // === 5xxx: Конфигурация/жизненный цикл ===
    ConfigInvalid = 5000,
    ServiceStopped = 5001,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    ///
    /// Возвращает `None`, если значение не соответствует ни одному варианту.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Вернёт `true`, если переданный `code` означает успешный результат.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Ошибка вызвана входными данными вызывающей стороны (сообщение или
    /// подписчик).
    pub fn is_client_error(&self) -> bool {
        (2000..=3999).contains(&self.code())
    }

    /// Ошибка связана с доставкой сообщения (диапазон 4xxx).
    pub fn is_delivery_error(&self) -> bool {
        (4000..=4999).contains(&self.code())
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::MissingTopic => LogLevel::Debug,
            Self::ReservedKey | Self::InvalidSubscriber => LogLevel::Info,
            Self::DeadLetter | Self::DeliveryFailed | Self::ServiceStopped => LogLevel::Warn,
            Self::Internal | Self::ConfigInvalid => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Тест проверяет разделение клиентских ошибок и ошибок доставки.
    #[test]
    fn test_client_vs_delivery() {
        assert!(StatusCode::MissingTopic.is_client_error());
        assert!(!StatusCode::Internal.is_client_error());
        assert!(StatusCode::ReservedKey.is_client_error());
        assert!(StatusCode::InvalidSubscriber.is_client_error());
        assert!(!StatusCode::DeadLetter.is_client_error());
        assert!(StatusCode::DeadLetter.is_delivery_error());
        assert!(StatusCode::DeliveryFailed.is_delivery_error());
        assert!(!StatusCode::ConfigInvalid.is_delivery_error());
    }

    /// Тест проверяет конвертацию через `TryFrom<u32>` и вспомогательную
    /// `from_u32`.
    #[test]
    fn test_from_try_from_u32() {
        let n = StatusCode::DeadLetter.code();
        assert_eq!(StatusCode::try_from(n).unwrap(), StatusCode::DeadLetter);
        assert!(StatusCode::from_u32(99999).is_none());
    }

    /// Тест проверяет получение числового представления и конвертацию
    /// `From<StatusCode> for u32`.
    #[test]
    fn test_code_and_into() {
        let c = StatusCode::InvalidSubscriber;
        assert_eq!(c.code(), 3000);
        let n: u32 = c.into();
        assert_eq!(n, 3000);
        assert!(StatusCode::is_success(StatusCode::Success.code()));
        assert!(!StatusCode::is_success(StatusCode::DeadLetter.code()));
    }

    /// Тест проверяет рекомендуемый уровень логирования для разных кодов.
    #[test]
    fn test_log_level_mappings() {
        assert_eq!(StatusCode::Success.log_level(), LogLevel::Trace);
        assert_eq!(StatusCode::MissingTopic.log_level(), LogLevel::Debug);
        assert_eq!(StatusCode::ReservedKey.log_level(), LogLevel::Info);
        assert_eq!(StatusCode::DeadLetter.log_level(), LogLevel::Warn);
        assert_eq!(StatusCode::ConfigInvalid.log_level(), LogLevel::Error);
    }

    /// Тест проверяет формат `Display`: строка должна содержать имя варианта и
    /// числовой код.
    #[test]
    fn test_display_contains_name_and_code() {
        let s = format!("{}", StatusCode::DeadLetter);
        assert!(
            s.contains("4000"),
            "Display must contain code 4000, got: {s}"
        );
        assert!(
            s.contains("DeadLetter"),
            "Display must contain variant name 'DeadLetter', got: {s}"
        );
    }
}
