use std::{any::Any, error::Error};

use crate::StatusCode;

/// Расширение для ошибок маршрутизатора (object-safe).
///
/// Даёт единый способ получить статус-код, безопасное сообщение для
/// вызывающей стороны, подробное сообщение для логов и теги для метрик.
pub trait ErrorExt: Error + Send + Sync + 'static {
    /// Статус-код ошибки.
    ///
    /// По умолчанию возвращает [`StatusCode::Internal`].
    fn status_code(&self) -> StatusCode {
        StatusCode::Internal
    }

    /// Возвращает ошибку как [`Any`](std::any::Any) для downcast.
    fn as_any(&self) -> &dyn Any;

    /// Сообщение, которое можно отдать наружу без внутренних деталей.
    fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::Internal => "Internal router error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Детализированное сообщение для логов.
    fn log_message(&self) -> String {
        format!("{self:?}")
    }

    /// Набор тегов для систем наблюдаемости.
    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
        ]
    }

    /// Короткое имя типа ошибки (без пути модулей).
    fn type_name(&self) -> String {
        std::any::type_name::<Self>()
            .split("::")
            .last()
            .unwrap_or("Unknown")
            .to_string()
    }
}
