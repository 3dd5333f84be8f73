use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::Layer as LayerTrait,
    registry::LookupSpan,
};

use super::config::{LogFormat, LoggingConfig};

/// Консольный fmt-слой в формате из конфигурации.
///
/// Возвращаем boxed trait-объект, чтобы стереть конкретный тип формата
/// (json/pretty/compact).
pub fn build_formatter_from_config<S, W>(
    config: &LoggingConfig,
    writer: W,
) -> Box<dyn LayerTrait<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .with_thread_ids(config.with_thread_ids)
        .with_line_number(config.with_line_numbers);

    match config.format {
        // ANSI-коды в JSON не нужны
        LogFormat::Json => Box::new(base.json().with_current_span(true).with_ansi(false)),
        LogFormat::Pretty => Box::new(base.pretty().with_span_events(FmtSpan::CLOSE)),
        LogFormat::Compact => Box::new(base.compact()),
    }
}
