// HandlerConfig and HandlerDescriptor.
// The configuration payload bound to a handler at construction time, and the
// serializable identity (type + config) used to rebuild handlers elsewhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised when a handler reads a configuration value it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration key not supplied: {0}")]
    MissingKey(String),

    #[error("configuration key '{key}' must be a {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("{0}")]
    Invalid(String),
}

/// Immutable configuration for one handler instance.
///
/// The payload is either plain text (`"test-config"`) or a structured JSON
/// record. There are no mutating accessors; a handler owns its config for its
/// whole lifetime and clones are cheap enough to share across instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerConfig(Value);

impl HandlerConfig {
    /// A plain-text configuration.
    pub fn text(value: impl Into<String>) -> Self {
        Self(Value::String(value.into()))
    }

    /// A structured configuration record.
    pub fn structured(value: Value) -> Self {
        Self(value)
    }

    /// An empty configuration (JSON `null`).
    pub fn empty() -> Self {
        Self(Value::Null)
    }

    /// Interpret raw configuration text.
    ///
    /// Only a JSON object or array becomes a structured record. Everything
    /// else, including JSON scalars like `42`, `true` or `null`, is kept
    /// verbatim as a text payload. Never fails.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self(value),
            _ => Self::text(raw),
        }
    }

    /// The text payload, if this is a plain-text configuration.
    pub fn as_text(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// The key/value record of a structured configuration.
    ///
    /// Text payloads and arrays are rejected with `ConfigError::Invalid`.
    pub fn require_record(&self) -> Result<&serde_json::Map<String, Value>, ConfigError> {
        self.0.as_object().ok_or_else(|| {
            ConfigError::Invalid("configuration must be a structured record".to_string())
        })
    }

    /// Look up a key in a structured configuration.
    ///
    /// Returns `None` for text payloads and for missing keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(key))
    }

    /// Look up a string value in a structured configuration.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Look up a required string value, for handlers that validate their
    /// configuration at construction.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.get(key) {
            None | Some(Value::Null) => Err(ConfigError::MissingKey(key.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for HandlerConfig {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for HandlerConfig {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<Value> for HandlerConfig {
    fn from(value: Value) -> Self {
        Self::structured(value)
    }
}

impl fmt::Display for HandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

/// The serializable identity of a handler instance.
///
/// Handler objects themselves never cross process boundaries. A descriptor
/// does, and the receiving side rebuilds the handler through a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// The registered handler type identifier (e.g. `exception-throwing`).
    pub handler_type: String,

    #[serde(default)]
    pub config: HandlerConfig,
}

impl HandlerDescriptor {
    pub fn new(handler_type: impl Into<String>, config: impl Into<HandlerConfig>) -> Self {
        Self {
            handler_type: handler_type.into(),
            config: config.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let descriptor: Self =
            serde_json::from_str(json).context("Failed to deserialize handler descriptor")?;
        if descriptor.handler_type.trim().is_empty() {
            anyhow::bail!("Handler descriptor must name a handler type");
        }
        Ok(descriptor)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize handler descriptor")
    }
}
