//! Core payload types. Domain-agnostic.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The body of a payload: an action name plus arbitrary data fields.
///
/// Serializes flat, so `Action::new("ADD_TODO").with_field("title", "x")`
/// becomes `{"action": "ADD_TODO", "title": "x"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "action")]
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Raw access to a data field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Typed access to a data field. `None` if it is absent or has the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fields
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// The full message handed to a dispatcher.
///
/// Both fields are optional so that payloads decoded from untyped JSON can be
/// carried through and rejected by whoever requires them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Payload {
    pub fn new(source: impl Into<String>, action: Action) -> Self {
        Self {
            source: Some(source.into()),
            action: Some(action),
        }
    }

    /// Decode a payload from an untyped JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Decode a payload from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }
}
