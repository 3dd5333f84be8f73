use std::sync::Arc;

use tidings_error::RouterResult;

use super::{
    AnnotationStep, MessageRouter, Pipeline, ReservedKeys, Sink, StreamSink, Translator,
};
use crate::config::RouterConfig;

/// Сборщик [`MessageRouter`] с внедряемыми зависимостями.
///
/// Без явных приёмников журнал идёт в stdout, dead-letter в stderr.
#[derive(Default)]
pub struct RouterBuilder {
    config: RouterConfig,
    log_sink: Option<Arc<dyn Sink>>,
    dead_sink: Option<Arc<dyn Sink>>,
    translator: Option<Arc<dyn Translator>>,
    extra_steps: Vec<Arc<dyn AnnotationStep>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Начальные значения из готовой конфигурации (например,
    /// [`RouterConfig::load`]).
    pub fn from_config(config: RouterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn raise_on_dead(
        mut self,
        strict: bool,
    ) -> Self {
        self.config.raise_on_dead = strict;
        self
    }

    pub fn annotation_prefix(
        mut self,
        prefix: impl Into<String>,
    ) -> Self {
        self.config.annotation_prefix = prefix.into();
        self
    }

    pub fn log_sink(
        mut self,
        sink: Arc<dyn Sink>,
    ) -> Self {
        self.log_sink = Some(sink);
        self
    }

    pub fn dead_sink(
        mut self,
        sink: Arc<dyn Sink>,
    ) -> Self {
        self.dead_sink = Some(sink);
        self
    }

    pub fn translator(
        mut self,
        translator: Arc<dyn Translator>,
    ) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Дополнительный шаг конвейера, выполняется после встроенных.
    pub fn annotation_step(
        mut self,
        step: Arc<dyn AnnotationStep>,
    ) -> Self {
        self.extra_steps.push(step);
        self
    }

    /// Проверяет конфигурацию и собирает маршрутизатор.
    pub fn build(self) -> RouterResult<MessageRouter> {
        self.config.validate()?;

        let keys = ReservedKeys::new(self.config.annotation_prefix.as_str());
        let mut pipeline = Pipeline::standard();
        for step in self.extra_steps {
            pipeline.push(step);
        }
        let log_sink = self
            .log_sink
            .unwrap_or_else(|| Arc::new(StreamSink::stdout()));
        let dead_sink = self
            .dead_sink
            .unwrap_or_else(|| Arc::new(StreamSink::stderr()));

        tracing::debug!(
            raise_on_dead = self.config.raise_on_dead,
            prefix = %self.config.annotation_prefix,
            steps = pipeline.len(),
            translator = self.translator.is_some(),
            "router built"
        );

        Ok(MessageRouter::from_parts(
            self.config,
            keys,
            pipeline,
            self.translator,
            log_sink,
            dead_sink,
        ))
    }
}

#[cfg(test)]
mod tests {
    use tidings_error::RouterError;

    use super::*;
    use crate::router::{MemorySink, Message};

    /// Тест проверяет значения по умолчанию.
    #[test]
    fn test_defaults() {
        let router = RouterBuilder::new().build().unwrap();
        assert!(!router.config().raise_on_dead);
        assert_eq!(router.keys().topic, ".topic");
    }

    /// Тест проверяет пользовательский префикс и отказ для пустого.
    #[test]
    fn test_custom_prefix() {
        let router = RouterBuilder::new()
            .annotation_prefix("@")
            .dead_sink(Arc::new(MemorySink::new()))
            .build()
            .unwrap();
        assert_eq!(router.keys().topic, "@topic");
        assert!(router.stats().contains("@total"));

        let err = RouterBuilder::new()
            .annotation_prefix("")
            .build()
            .unwrap_err();
        assert!(matches!(err, RouterError::Config { .. }));
    }

    /// Тест проверяет, что дополнительный шаг видит результат встроенных.
    #[test]
    fn test_extra_annotation_step() {
        let dead = Arc::new(MemorySink::new());
        let router = RouterBuilder::from_config(RouterConfig::default())
            .dead_sink(dead.clone())
            .annotation_step(Arc::new(|m: Message, keys: &ReservedKeys| -> Message {
                let stamped = m.contains_key(&keys.time);
                m.with("stamped", stamped)
            }))
            .build()
            .unwrap();

        router.publish(router.message("void")).unwrap();

        let records = dead.records();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].message.get("stamped"),
            Some(&serde_json::Value::Bool(true))
        );
    }
}
