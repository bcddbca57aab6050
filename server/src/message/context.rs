//! Per-invocation Context
//!
//! A key/value bag created fresh for every pipeline run. Handlers read the
//! parsed message from it and use it to pass data between phases.

use std::collections::HashMap;
use std::sync::Arc;

use wx_common::Message;

use super::handler::MessageHandler;

/// Key of the parsed [`Message`].
pub const MESSAGE: &str = "message";
/// Key of the raw payload text.
pub const RAW_MESSAGE: &str = "raw_message";
/// Key of the handler that produced the current result.
pub const HANDLER: &str = "handler";
/// Key of the most recent handler result.
pub const HANDLE_RESULT: &str = "handle_result";
/// When `true`, handling continues after a handler produced a result.
pub const SHOULD_CONTINUE: &str = "should_continue";

/// A value stored in a [`Context`].
#[derive(Clone)]
pub enum ContextValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Message(Arc<Message>),
    Handler(Arc<dyn MessageHandler>),
}

impl ContextValue {
    /// Short name of the variant, for diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
            Self::Message(_) => "message",
            Self::Handler(_) => "handler",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::Bytes(v) => f.debug_tuple("Bytes").field(&v.len()).finish(),
            Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Self::Message(v) => f.debug_tuple("Message").field(&v.msg_type_str()).finish(),
            Self::Handler(v) => f.debug_tuple("Handler").field(&v.name()).finish(),
        }
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Handler(a), Self::Handler(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for ContextValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Arc<Message>> for ContextValue {
    fn from(value: Arc<Message>) -> Self {
        Self::Message(value)
    }
}

/// Key/value bag threaded through one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: HashMap<String, ContextValue>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for seeding caller fields.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert or overwrite a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.values.remove(key)
    }

    /// Insert each field only when its key is absent.
    pub fn defaults<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        for (key, value) in fields {
            self.values.entry(key.into()).or_insert_with(|| value.into());
        }
        self
    }

    /// Insert each field, overwriting existing keys.
    pub fn extends<I, K, V>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        for (key, value) in fields {
            self.set(key, value);
        }
        self
    }

    pub fn message(&self) -> Option<&Message> {
        match self.get(MESSAGE)? {
            ContextValue::Message(message) => Some(message.as_ref()),
            _ => None,
        }
    }

    pub fn raw_message(&self) -> Option<&str> {
        self.get(RAW_MESSAGE)?.as_str()
    }

    pub fn handler(&self) -> Option<&Arc<dyn MessageHandler>> {
        match self.get(HANDLER)? {
            ContextValue::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    pub fn handle_result(&self) -> Option<&ContextValue> {
        self.get(HANDLE_RESULT)
    }

    pub fn should_continue(&self) -> bool {
        self.get(SHOULD_CONTINUE)
            .and_then(ContextValue::as_bool)
            .unwrap_or(false)
    }

    pub fn set_should_continue(&mut self, value: bool) {
        self.set(SHOULD_CONTINUE, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for Context {
    type Item = (String, ContextValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, ContextValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        context.extends(iter);
        context
    }
}
