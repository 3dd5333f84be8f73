//! Путь публикации: проверка ключей → аннотации → транслятор → fan-out
//! или dead-letter → статистика → приёмники.

use tidings_error::{DeliveryFailure, RouterError, RouterResult};
use tracing::Level;

use super::{identity, Message, MessageRouter, Record, RecordKind, SubscriberRef};

impl MessageRouter {
    /// Публикует сообщение с уровнем `INFO`.
    pub fn publish(
        &self,
        message: Message,
    ) -> RouterResult<()> {
        self.publish_with_level(message, Level::INFO)
    }

    /// Публикует сообщение; `level` передаётся приёмнику записи.
    ///
    /// Каждый подписчик темы вызывается ровно один раз, даже если
    /// предыдущие вернули ошибку; ошибки собираются в
    /// [`RouterError::DeliveryFailed`] после записи в журнал.
    pub fn publish_with_level(
        &self,
        message: Message,
        level: Level,
    ) -> RouterResult<()> {
        self.check_message_keys(&message)?;
        self.route(message, level, self.config.raise_on_dead)
    }

    /// Ключи с зарезервированным префиксом, кроме ключей метаданных
    /// сообщения, пользователю недоступны.
    fn check_message_keys(
        &self,
        message: &Message,
    ) -> RouterResult<()> {
        match message
            .keys()
            .find(|k| self.keys.is_reserved(k) && !self.keys.is_message_key(k))
        {
            Some(key) => Err(RouterError::ReservedKey { key: key.clone() }),
            None => Ok(()),
        }
    }

    /// Общий путь для пользовательских публикаций и событий `sub`/`unsub`.
    pub(crate) fn route(
        &self,
        message: Message,
        level: Level,
        strict: bool,
    ) -> RouterResult<()> {
        let message = self.pipeline.run(message, &self.keys);
        let message = match &self.translator {
            Some(translator) => translator.translate(message),
            None => message,
        };

        let topic = match message.get_str(&self.keys.topic) {
            Some(topic) => topic.to_string(),
            None => {
                return Err(RouterError::MissingTopic {
                    key: self.keys.topic.clone(),
                })
            }
        };
        if self.keys.is_reserved(&topic) {
            return Err(RouterError::ReservedTopic { topic });
        }

        // Снимок под блокировкой; счётчики обновляются до вызова подписчиков.
        let subscribers = {
            let mut state = self.state.lock();
            let subscribers = state.registry.snapshot(&topic);
            if subscribers.is_empty() {
                state.stats.record_dead(&topic);
            } else {
                state.stats.record_sent(&topic);
            }
            subscribers
        };

        if subscribers.is_empty() {
            return self.dead_letter(&topic, &message, level, strict);
        }

        tracing::trace!(topic = %topic, subscribers = subscribers.len(), "dispatching");
        let failures = fan_out(&subscribers, &message);

        self.log_sink.write(
            level,
            &Record {
                kind: RecordKind::Sent,
                topic: &topic,
                message: &message,
            },
        );

        if failures.is_empty() {
            return Ok(());
        }
        tracing::warn!(
            topic = %topic,
            failed = failures.len(),
            attempted = subscribers.len(),
            "delivery failed for some subscribers"
        );
        Err(RouterError::DeliveryFailed {
            topic,
            attempted: subscribers.len(),
            failures,
        })
    }

    fn dead_letter(
        &self,
        topic: &str,
        message: &Message,
        level: Level,
        strict: bool,
    ) -> RouterResult<()> {
        if strict {
            tracing::warn!(topic, "strict mode: rejecting dead message");
            return Err(RouterError::DeadMessage {
                topic: topic.to_string(),
            });
        }
        tracing::debug!(topic, "no subscribers, diverting to dead-letter sink");
        self.dead_sink.write(
            level,
            &Record {
                kind: RecordKind::Dead,
                topic,
                message,
            },
        );
        Ok(())
    }
}

/// Вызывает каждого подписчика из снимка; ошибки не прерывают обход.
fn fan_out(
    subscribers: &[SubscriberRef],
    message: &Message,
) -> Vec<DeliveryFailure> {
    subscribers
        .iter()
        .filter_map(|sub| match sub.deliver(message) {
            Ok(()) => None,
            Err(error) => Some(DeliveryFailure {
                subscriber: identity(sub),
                error,
            }),
        })
        .collect()
}
