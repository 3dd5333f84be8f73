//! Annotation pipeline: router metadata stamped on every inbound message.
//!
//! Built-in steps run in a fixed order (timestamp, message id, trace id),
//! followed by any caller-supplied steps. Each step takes the message by
//! value and returns the annotated one.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::{Message, ReservedKeys};

/// One transformation applied to every message before dispatch.
pub trait AnnotationStep: Send + Sync {
    fn annotate(
        &self,
        message: Message,
        keys: &ReservedKeys,
    ) -> Message;
}

impl<F> AnnotationStep for F
where
    F: Fn(Message, &ReservedKeys) -> Message + Send + Sync,
{
    fn annotate(
        &self,
        message: Message,
        keys: &ReservedKeys,
    ) -> Message {
        self(message, keys)
    }
}

/// Sets the time key to the current epoch milliseconds. Always overwrites.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampStep;

impl AnnotationStep for TimestampStep {
    fn annotate(
        &self,
        mut message: Message,
        keys: &ReservedKeys,
    ) -> Message {
        message.insert(keys.time.clone(), Utc::now().timestamp_millis());
        message
    }
}

/// Sets a fresh unique id if the message has none.
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageIdStep;

impl AnnotationStep for MessageIdStep {
    fn annotate(
        &self,
        message: Message,
        keys: &ReservedKeys,
    ) -> Message {
        set_if_absent(message, &keys.msg_uuid)
    }
}

/// Sets a fresh trace id if the message has none; an existing trace id
/// survives any number of router passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceStep;

impl AnnotationStep for TraceStep {
    fn annotate(
        &self,
        message: Message,
        keys: &ReservedKeys,
    ) -> Message {
        set_if_absent(message, &keys.trace)
    }
}

fn set_if_absent(
    mut message: Message,
    key: &str,
) -> Message {
    if !message.contains_key(key) {
        message.insert(key, Value::String(Uuid::new_v4().to_string()));
    }
    message
}

/// Ordered sequence of annotation steps.
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn AnnotationStep>>,
}

impl Pipeline {
    /// Pipeline with the three built-in steps.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Arc::new(TimestampStep),
                Arc::new(MessageIdStep),
                Arc::new(TraceStep),
            ],
        }
    }

    /// Appends a step after the existing ones.
    pub fn push(
        &mut self,
        step: Arc<dyn AnnotationStep>,
    ) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn run(
        &self,
        message: Message,
        keys: &ReservedKeys,
    ) -> Message {
        self.steps
            .iter()
            .fold(message, |msg, step| step.annotate(msg, keys))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
