//! Внутрипроцессный маршрутизатор publish/subscribe.
//!
//! - `registry`: тема → подписчики (сравнение по ссылке).
//! - `annotate`: конвейер аннотаций (время, id сообщения, trace id).
//! - `dispatch`: публикация, fan-out, dead-letter.
//! - `stats`: счётчики и текстовая сводка.
//! - `sink`, `translator`: внедряемые внешние зависимости.

pub mod annotate;
mod builder;
mod dispatch;
pub mod keys;
pub mod message;
mod registry;
pub mod sink;
pub mod stats;
pub mod subscriber;
pub mod translator;

use std::{collections::BTreeSet, fmt, sync::Arc};

use parking_lot::Mutex;
use tidings_error::{ErrorExt, RouterError, RouterResult};
use tracing::Level;

pub use annotate::{AnnotationStep, MessageIdStep, Pipeline, TimestampStep, TraceStep};
pub use builder::RouterBuilder;
pub use keys::{ReservedKeys, DEFAULT_PREFIX};
pub use message::Message;
pub use sink::{CapturedRecord, MemorySink, Record, RecordKind, Sink, StreamSink, TracingSink};
pub use stats::{Report, Stats};
pub use subscriber::{identity, same_subscriber, Subscriber, SubscriberRef, Topics};
pub use translator::Translator;

use crate::config::RouterConfig;
use registry::{Registry, Removal};
use stats::Statistics;

/// Тема событий о новой подписке.
pub const SUB_TOPIC: &str = "sub";
/// Тема событий об отписке.
pub const UNSUB_TOPIC: &str = "unsub";
/// Поле события: тема, к которой относится подписка.
pub const TO_TOPIC_FIELD: &str = "to_topic";
/// Поле события: строка идентичности подписчика.
pub const SUBBER_FIELD: &str = "subber";

/// Изменяемое состояние под одной блокировкой.
///
/// Блокировка никогда не удерживается во время вызова подписчиков,
/// приёмников или транслятора, поэтому подписчик может повторно входить
/// в маршрутизатор.
struct RouterState {
    registry: Registry,
    stats: Statistics,
}

/// Маршрутизатор сообщений.
///
/// Все операции синхронны и выполняются в потоке вызывающего. Для
/// совместного использования оборачивается в `Arc`.
pub struct MessageRouter {
    config: RouterConfig,
    keys: ReservedKeys,
    pipeline: Pipeline,
    translator: Option<Arc<dyn Translator>>,
    log_sink: Arc<dyn Sink>,
    dead_sink: Arc<dyn Sink>,
    state: Mutex<RouterState>,
}

impl MessageRouter {
    /// Маршрутизатор с конфигурацией по умолчанию: stdout/stderr, без
    /// транслятора, нестрогий режим, префикс `.`.
    pub fn new() -> Self {
        let config = RouterConfig::default();
        let keys = ReservedKeys::new(config.annotation_prefix.as_str());
        Self::from_parts(
            config,
            keys,
            Pipeline::standard(),
            None,
            Arc::new(StreamSink::stdout()),
            Arc::new(StreamSink::stderr()),
        )
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub(crate) fn from_parts(
        config: RouterConfig,
        keys: ReservedKeys,
        pipeline: Pipeline,
        translator: Option<Arc<dyn Translator>>,
        log_sink: Arc<dyn Sink>,
        dead_sink: Arc<dyn Sink>,
    ) -> Self {
        let state = RouterState {
            registry: Registry::default(),
            stats: Statistics::new(&keys),
        };
        Self {
            config,
            keys,
            pipeline,
            translator,
            log_sink,
            dead_sink,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn keys(&self) -> &ReservedKeys {
        &self.keys
    }

    /// Новое сообщение с заполненным ключом темы.
    pub fn message(
        &self,
        topic: impl Into<String>,
    ) -> Message {
        Message::new().with(self.keys.topic.clone(), topic.into())
    }

    /// Подписывает `subscriber` на одну или несколько тем.
    ///
    /// Для каждой темы: добавление без дубликатов, создание счётчика,
    /// удаление темы из множества мёртвых и публикация события `sub`.
    pub fn subscribe(
        &self,
        topics: impl Into<Topics>,
        subscriber: SubscriberRef,
    ) -> RouterResult<()> {
        let topics = topics.into();
        let subber = identity(&subscriber);

        if !subscriber.accepts_messages() {
            tracing::debug!(subscriber = %subber, "rejected subscriber without delivery capability");
            return Err(RouterError::InvalidSubscriber {
                subscriber: subber,
            });
        }
        for topic in topics.iter() {
            self.check_topic(topic)?;
        }

        for topic in topics.iter() {
            let added = {
                let mut state = self.state.lock();
                let added = state.registry.add(topic, &subscriber);
                state.stats.ensure_topic(topic);
                state.stats.revive(topic);
                added
            };
            tracing::debug!(topic, subscriber = %subber, added, "subscribed");
            self.emit_event(SUB_TOPIC, topic, &subber);
        }
        Ok(())
    }

    /// Отписывает `subscriber` от темы. Отсутствующая подписка не считается ошибкой.
    ///
    /// Тема, оставшаяся без подписчиков, попадает в множество мёртвых.
    pub fn unsubscribe(
        &self,
        topic: &str,
        subscriber: &SubscriberRef,
    ) -> RouterResult<()> {
        self.check_topic(topic)?;
        let subber = identity(subscriber);

        let removal = {
            let mut state = self.state.lock();
            let removal = state.registry.remove(topic, subscriber);
            if let Removal::Removed { now_empty: true } = removal {
                state.stats.mark_dead(topic);
            }
            removal
        };
        tracing::debug!(topic, subscriber = %subber, ?removal, "unsubscribed");
        self.emit_event(UNSUB_TOPIC, topic, &subber);
        Ok(())
    }

    /// Снимок счётчиков.
    pub fn stats(&self) -> Stats {
        self.state.lock().stats.snapshot()
    }

    /// Снимок множества тем без подписчиков.
    pub fn dead_topics(&self) -> BTreeSet<String> {
        self.state.lock().stats.dead_topics()
    }

    /// Снимок подписчиков темы.
    pub fn subscribers(
        &self,
        topic: &str,
    ) -> Vec<SubscriberRef> {
        self.state.lock().registry.snapshot(topic)
    }

    pub fn subscriber_count(
        &self,
        topic: &str,
    ) -> usize {
        self.state.lock().registry.count(topic)
    }

    /// Все темы, когда-либо получавшие подписчика.
    pub fn topics(&self) -> Vec<String> {
        self.state.lock().registry.topics()
    }

    /// Сводка для человека, собранная под одной блокировкой.
    pub fn report(&self) -> Report {
        let state = self.state.lock();
        Report {
            stats: state.stats.snapshot(),
            dead_topics: state.stats.dead_topics(),
            subscribers: state.registry.listing(),
        }
    }

    pub fn render_debug(&self) -> String {
        self.report().to_string()
    }

    /// Темы в зарезервированном пространстве имён конфликтуют с ключами
    /// статистики.
    fn check_topic(
        &self,
        topic: &str,
    ) -> RouterResult<()> {
        if self.keys.is_reserved(topic) {
            return Err(RouterError::ReservedTopic {
                topic: topic.to_string(),
            });
        }
        Ok(())
    }

    /// Событие `sub`/`unsub` проходит полный путь публикации, но без
    /// строгого режима: реестр уже изменён, и вызов не должен падать.
    fn emit_event(
        &self,
        event: &str,
        topic: &str,
        subber: &str,
    ) {
        let message = self
            .message(event)
            .with(TO_TOPIC_FIELD, topic)
            .with(SUBBER_FIELD, subber);
        if let Err(e) = self.route(message, Level::INFO, false) {
            tracing::warn!(
                event,
                topic,
                code = %e.status_code(),
                error = %e,
                "self-describing event was not fully delivered"
            );
        }
    }
}

impl Default for MessageRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageRouter {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "MessageRouter {{ config: {:?} }}", self.config)?;
        write!(f, "{}", self.report())
    }
}
