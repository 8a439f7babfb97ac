//! The attribute map of one resource instance, as controllers see it.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Read access shared by a resource's attribute map and its nested blocks.
///
/// Absent and `null` attributes read as their zero value. An empty string is
/// a concrete value and only [`get_optional_string`](Self::get_optional_string)
/// tells it apart from absence.
pub trait AttributeReader {
    /// The attribute value, or `None` when absent or null.
    fn raw(&self, name: &str) -> Option<&Value>;

    /// String value, `""` when unset.
    fn get_string(&self, name: &str) -> String {
        match self.raw(name) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// String value with explicit presence.
    fn get_optional_string(&self, name: &str) -> Option<String> {
        self.raw(name).map(|_| self.get_string(name))
    }

    /// String value, `None` when unset or empty.
    fn get_non_empty_string(&self, name: &str) -> Option<String> {
        Some(self.get_string(name)).filter(|s| !s.is_empty())
    }

    /// Boolean value, `false` when unset.
    fn get_bool(&self, name: &str) -> bool {
        self.get_bool_or(name, false)
    }

    /// Boolean value, `default` when unset.
    ///
    /// States written by older versions may carry `"true"`/`"false"` strings.
    fn get_bool_or(&self, name: &str, default: bool) -> bool {
        self.raw(name).and_then(as_bool).unwrap_or(default)
    }

    /// Integer value with explicit presence.
    fn get_i64(&self, name: &str) -> Option<i64> {
        match self.raw(name)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Elements of a string set, sorted and without duplicates.
    fn get_string_set(&self, name: &str) -> Vec<String> {
        let mut items: Vec<String> = match self.raw(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            _ => Vec::new(),
        };
        items.sort();
        items.dedup();
        items
    }

    /// A string map; non-string values are rendered as text.
    fn get_string_map(&self, name: &str) -> BTreeMap<String, String> {
        match self.raw(name) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| {
                    let value = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), value)
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// Elements of a nested block collection.
    ///
    /// Set blocks have no order; elements come back sorted by content so
    /// request payloads do not depend on how the host ordered them.
    fn get_blocks(&self, name: &str) -> Vec<BlockData> {
        let mut blocks: Vec<BlockData> = match self.raw(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_object().cloned().map(BlockData))
                .collect(),
            Some(Value::Object(single)) => vec![BlockData(single.clone())],
            _ => Vec::new(),
        };
        blocks.sort_by_cached_key(|b| Value::Object(b.0.clone()).to_string());
        blocks
    }
}

/// One element of a nested block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockData(pub Map<String, Value>);

impl BlockData {
    /// Names of the attributes present in this element.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl AttributeReader for BlockData {
    fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }
}

/// Working copy of a resource instance's state.
///
/// Controllers read the desired values, write what the API returned and
/// hand the result back to the host with [`into_state`](Self::into_state).
/// During an update the prior state is kept alongside for change checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    prior: Map<String, Value>,
    state: Map<String, Value>,
}

impl ResourceData {
    /// Wrap a state object. `null` is an empty state.
    pub fn new(state: Value) -> Result<Self, ProviderError> {
        Ok(Self {
            prior: Map::new(),
            state: into_object(state)?,
        })
    }

    /// Wrap a planned state together with the state it replaces.
    pub fn for_update(prior: Value, planned: Value) -> Result<Self, ProviderError> {
        Ok(Self {
            prior: into_object(prior)?,
            state: into_object(planned)?,
        })
    }

    /// A state holding only an identifier.
    pub fn from_id(id: impl Into<String>) -> Self {
        let mut data = Self::default();
        data.set_id(id);
        data
    }

    /// The identifier, when one has been assigned.
    pub fn id(&self) -> Option<&str> {
        self.state
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The identifier, or an error for states that were never created.
    pub fn require_id(&self) -> Result<String, ProviderError> {
        self.id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Validation("resource state has no id".to_string()))
    }

    /// Assign the identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.set("id", id.into());
    }

    /// Overwrite an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.state.insert(name.to_string(), value.into());
    }

    /// Overwrite a timestamp attribute; unset times become `""`.
    pub fn set_time(&mut self, name: &str, time: Option<DateTime<Utc>>) {
        self.set(name, format_time(time));
    }

    /// Put back the prior value of an attribute.
    pub fn restore(&mut self, name: &str) {
        match self.prior.get(name) {
            Some(value) => {
                self.state.insert(name.to_string(), value.clone());
            },
            None => {
                self.state.remove(name);
            },
        }
    }

    /// Whether an attribute differs from its prior value.
    ///
    /// Absent, null and zero values are all "unset" and compare equal.
    pub fn has_change(&self, name: &str) -> bool {
        let prior = self.prior.get(name).filter(|v| !is_zero(v));
        let current = self.state.get(name).filter(|v| !is_zero(v));
        prior != current
    }

    /// Whether a boolean attribute differs from its prior value, reading
    /// `"true"`/`"false"` strings as booleans and unset as `false`.
    pub fn has_bool_change(&self, name: &str) -> bool {
        let read = |map: &Map<String, Value>| map.get(name).and_then(as_bool).unwrap_or(false);
        read(&self.prior) != read(&self.state)
    }

    /// The state to hand back to the host.
    pub fn into_state(self) -> Value {
        Value::Object(self.state)
    }
}

impl AttributeReader for ResourceData {
    fn raw(&self, name: &str) -> Option<&Value> {
        self.state.get(name).filter(|v| !v.is_null())
    }
}

/// RFC 3339 in UTC with second precision, or `""`.
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// A boolean, or the string spelling of one.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Whether a value is the zero value of its type.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, ProviderError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ProviderError::Validation(format!(
            "resource state must be an object, got {}",
            other
        ))),
    }
}
