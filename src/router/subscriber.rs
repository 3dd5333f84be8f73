use std::{borrow::Cow, sync::Arc};

use tidings_error::DeliveryError;

use super::Message;

/// Получатель сообщений маршрутизатора.
///
/// Доставка синхронная: `deliver` вызывается в потоке того, кто
/// публикует. Подписчик может повторно входить в маршрутизатор
/// (subscribe/unsubscribe/publish) прямо из `deliver`.
pub trait Subscriber: Send + Sync {
    /// Принимает одно аннотированное сообщение.
    fn deliver(
        &self,
        message: &Message,
    ) -> Result<(), DeliveryError>;

    /// Проверка способности принимать сообщения при регистрации.
    ///
    /// Подписчик, вернувший `false`, отклоняется с `InvalidSubscriber`.
    fn accepts_messages(&self) -> bool {
        true
    }

    /// Человекочитаемое имя для строки идентичности.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl<F> Subscriber for F
where
    F: Fn(&Message) -> Result<(), DeliveryError> + Send + Sync,
{
    fn deliver(
        &self,
        message: &Message,
    ) -> Result<(), DeliveryError> {
        self(message)
    }
}

/// Разделяемая ссылка на подписчика. Реестр сравнивает их по адресу.
pub type SubscriberRef = Arc<dyn Subscriber>;

/// Сравнение по идентичности (адрес данных, без учёта vtable).
pub fn same_subscriber(
    a: &SubscriberRef,
    b: &SubscriberRef,
) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Строка идентичности: `<имя>#<адрес экземпляра>`.
///
/// Только для событий и отладочного вывода, никогда не для сравнения.
pub fn identity(subscriber: &SubscriberRef) -> String {
    let addr = Arc::as_ptr(subscriber) as *const () as usize;
    format!("{}#{addr:#x}", subscriber.name())
}

/// Одна тема или упорядоченный список тем.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics(Vec<String>);

impl Topics {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Topics {
    fn from(topic: &str) -> Self {
        Self(vec![topic.to_string()])
    }
}

impl From<String> for Topics {
    fn from(topic: String) -> Self {
        Self(vec![topic])
    }
}

impl From<&String> for Topics {
    fn from(topic: &String) -> Self {
        Self(vec![topic.clone()])
    }
}

impl<S: Into<String>> From<Vec<S>> for Topics {
    fn from(topics: Vec<S>) -> Self {
        Self(topics.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for Topics {
    fn from(topics: &[S]) -> Self {
        Self(topics.iter().map(|t| t.as_ref().to_string()).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Topics {
    fn from(topics: [S; N]) -> Self {
        Self(topics.into_iter().map(Into::into).collect())
    }
}
