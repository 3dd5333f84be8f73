//! Приёмники записей маршрутизатора.
//!
//! Журнал доставленных сообщений и журнал «мёртвых» сообщений являются
//! внешними зависимостями, внедряемыми при сборке маршрутизатора. Здесь лежат трейт и
//! реализации по умолчанию.

use std::{
    fmt,
    io::{self, Write},
};

use parking_lot::Mutex;
use tracing::Level;

use super::Message;

/// Вид записи.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Сообщение доставлено подписчикам.
    Sent,
    /// Подписчиков нет, сообщение отправлено в dead-letter.
    Dead,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Одна запись для приёмника.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub kind: RecordKind,
    pub topic: &'a str,
    pub message: &'a Message,
}

impl Record<'_> {
    /// Однострочное представление: `LEVEL kind topic <json>`.
    pub fn to_line(
        &self,
        level: Level,
    ) -> String {
        let body = serde_json::to_string(self.message).unwrap_or_else(|_| "{}".to_string());
        format!("{level} {} {} {body}", self.kind, self.topic)
    }
}

/// Приёмник записей с уровнем.
pub trait Sink: Send + Sync {
    fn write(
        &self,
        level: Level,
        record: &Record<'_>,
    );
}

/// Какой стандартный поток использовать.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Построчная запись в stdout или stderr.
#[derive(Debug)]
pub struct StreamSink {
    stream: Stream,
}

impl StreamSink {
    /// Приёмник по умолчанию для доставленных сообщений.
    pub fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    /// Приёмник по умолчанию для dead-letter.
    pub fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }
}

impl Sink for StreamSink {
    fn write(
        &self,
        level: Level,
        record: &Record<'_>,
    ) {
        let line = record.to_line(level);
        let result = match self.stream {
            Stream::Stdout => writeln!(io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(io::stderr().lock(), "{line}"),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, kind = %record.kind, topic = record.topic, "sink write failed");
        }
    }
}

/// Пересылает записи в `tracing` на уровне записи.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn write(
        &self,
        level: Level,
        record: &Record<'_>,
    ) {
        let body = serde_json::to_string(record.message).unwrap_or_default();
        let kind = record.kind.as_str();
        let topic = record.topic;
        // `tracing::event!` требует константный уровень
        if level == Level::TRACE {
            tracing::trace!(target: "tidings::sink", kind, topic, message = %body);
        } else if level == Level::DEBUG {
            tracing::debug!(target: "tidings::sink", kind, topic, message = %body);
        } else if level == Level::INFO {
            tracing::info!(target: "tidings::sink", kind, topic, message = %body);
        } else if level == Level::WARN {
            tracing::warn!(target: "tidings::sink", kind, topic, message = %body);
        } else {
            tracing::error!(target: "tidings::sink", kind, topic, message = %body);
        }
    }
}

/// Запись, сохранённая [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub level: Level,
    pub kind: RecordKind,
    pub topic: String,
    pub message: Message,
}

/// Потокобезопасный приёмник, хранящий записи в памяти.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия всех записей на момент вызова.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Забирает накопленные записи, очищая буфер.
    pub fn drain(&self) -> Vec<CapturedRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl Sink for MemorySink {
    fn write(
        &self,
        level: Level,
        record: &Record<'_>,
    ) {
        self.records.lock().push(CapturedRecord {
            level,
            kind: record.kind,
            topic: record.topic.to_string(),
            message: record.message.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use tracing_subscriber::{fmt::MakeWriter, prelude::*, registry::Registry};

    use super::*;

    // Мини-буферный writer для проверки вывода tracing
    #[derive(Clone, Default)]
    struct Buffer(Arc<StdMutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl io::Write for Buffer {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample() -> Message {
        Message::new().with(".topic", "orders").with("amount", 10)
    }

    /// Тест проверяет формат строки записи.
    #[test]
    fn test_record_line_format() {
        let msg = sample();
        let record = Record {
            kind: RecordKind::Dead,
            topic: "orders",
            message: &msg,
        };
        assert_eq!(
            record.to_line(Level::WARN),
            r#"WARN dead orders {".topic":"orders","amount":10}"#
        );
    }

    /// Тест проверяет, что MemorySink сохраняет уровень, вид и копию
    /// сообщения.
    #[test]
    fn test_memory_sink_captures() {
        let sink = MemorySink::new();
        let msg = sample();
        sink.write(
            Level::INFO,
            &Record {
                kind: RecordKind::Sent,
                topic: "orders",
                message: &msg,
            },
        );

        assert_eq!(sink.len(), 1);
        let records = sink.records();
        assert_eq!(records[0].level, Level::INFO);
        assert_eq!(records[0].kind, RecordKind::Sent);
        assert_eq!(records[0].topic, "orders");
        assert_eq!(records[0].message, msg);

        assert_eq!(sink.drain().len(), 1);
        assert!(sink.is_empty());
    }

    /// Тест проверяет, что TracingSink пишет событие с темой и видом записи.
    #[test]
    fn test_tracing_sink_emits_event() {
        let buffer = Buffer::default();
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(buffer.clone())
            .with_ansi(false);
        let subscriber = Registry::default().with(layer);

        let msg = sample();
        tracing::subscriber::with_default(subscriber, || {
            TracingSink.write(
                Level::WARN,
                &Record {
                    kind: RecordKind::Dead,
                    topic: "orders",
                    message: &msg,
                },
            );
        });

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("WARN"), "got: {out}");
        assert!(out.contains("kind=\"dead\""), "got: {out}");
        assert!(out.contains("topic=\"orders\""), "got: {out}");
    }

    /// Тест проверяет, что StreamSink пишет без паники.
    #[test]
    fn test_stream_sinks_write() {
        let msg = sample();
        let record = Record {
            kind: RecordKind::Sent,
            topic: "orders",
            message: &msg,
        };
        StreamSink::stdout().write(Level::INFO, &record);
        StreamSink::stderr().write(Level::INFO, &record);
    }
}
