/// Router configuration loading.
pub mod config;
/// Structured logging setup (formats, filters).
pub mod logging;
/// Publish/subscribe router: registry, annotation, dispatch, statistics.
pub mod router;
/// Serialized async front-end over the router.
pub mod service;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// config
pub use self::config::{RouterConfig, ENV_PREFIX};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingError};
/// Router core, message model and collaborators.
pub use router::{
    identity, same_subscriber, AnnotationStep, CapturedRecord, MemorySink, Message,
    MessageIdStep, MessageRouter, Pipeline, Record, RecordKind, Report, ReservedKeys,
    RouterBuilder, Sink, Stats, StreamSink, Subscriber, SubscriberRef, TimestampStep, Topics,
    TraceStep, TracingSink, Translator, DEFAULT_PREFIX, SUBBER_FIELD, SUB_TOPIC, TO_TOPIC_FIELD,
    UNSUB_TOPIC,
};
/// Record level accepted by `publish_with_level` and sinks.
pub use tracing::Level;
/// Async service.
pub use service::{RouterHandle, RouterService};
/// Operation errors and result types.
pub use tidings_error::{
    DeliveryError, DeliveryFailure, ErrorExt, RouterError, RouterResult, StatusCode,
};
