//! Reserved router-owned keys, derived once from the configured prefix.

/// Default prefix for reserved keys.
pub const DEFAULT_PREFIX: &str = ".";

/// Full names of the reserved keys for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedKeys {
    prefix: String,
    pub topic: String,
    pub time: String,
    pub msg_uuid: String,
    pub trace: String,
    pub total: String,
    pub dead: String,
}

impl ReservedKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let key = |name: &str| format!("{prefix}{name}");
        Self {
            topic: key("topic"),
            time: key("time"),
            msg_uuid: key("msg_uuid"),
            trace: key("trace"),
            total: key("total"),
            dead: key("dead"),
            prefix,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Any key inside the reserved namespace.
    pub fn is_reserved(
        &self,
        key: &str,
    ) -> bool {
        key.starts_with(&self.prefix)
    }

    /// Reserved keys a message may legitimately carry.
    pub fn is_message_key(
        &self,
        key: &str,
    ) -> bool {
        key == self.topic || key == self.time || key == self.msg_uuid || key == self.trace
    }
}

impl Default for ReservedKeys {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
