use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured message: an insertion-ordered map of string keys to JSON values.
///
/// Router metadata lives under reserved keys (see [`super::ReservedKeys`]);
/// everything else belongs to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: Map<String, Value>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Inserts a field, returning the previous value if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Value under `key` if it is a string.
    pub fn get_str(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Value> {
        // shift_remove keeps the remaining fields in insertion order
        self.fields.shift_remove(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Message> for Value {
    fn from(msg: Message) -> Self {
        Value::Object(msg.fields)
    }
}

impl TryFrom<Value> for Message {
    type Error = Value;

    /// Only JSON objects convert; anything else is handed back unchanged.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(other),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Message
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
