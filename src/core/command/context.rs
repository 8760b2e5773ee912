//! Parameter carrier for one command invocation.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::execution::result::ResultHandle;

/// Value shapes a command can consume from a context.
///
/// Closed over the types the binding framework knows how to validate;
/// `Shared` is the escape hatch for backend-specific payloads.
#[derive(Clone)]
pub enum ContextValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Path(PathBuf),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
    Json(serde_json::Value),
    Result(ResultHandle),
    Shared(Arc<dyn Any + Send + Sync>),
}

impl ContextValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextValue::Null => "null",
            ContextValue::Bool(_) => "bool",
            ContextValue::Int(_) => "int",
            ContextValue::Text(_) => "text",
            ContextValue::Path(_) => "path",
            ContextValue::List(_) => "list",
            ContextValue::Map(_) => "map",
            ContextValue::Json(_) => "json",
            ContextValue::Result(_) => "execution result",
            ContextValue::Shared(_) => "shared",
        }
    }

    /// Short rendering for diagnostics; never used as data.
    pub fn describe(&self) -> String {
        match self {
            ContextValue::Null => "null".to_string(),
            ContextValue::Bool(value) => value.to_string(),
            ContextValue::Int(value) => value.to_string(),
            ContextValue::Text(value) => format!("\"{}\"", value),
            ContextValue::Path(value) => format!("\"{}\"", value.display()),
            ContextValue::List(value) => format!("list of {} entries", value.len()),
            ContextValue::Map(value) => format!("map of {} entries", value.len()),
            ContextValue::Json(value) => value.to_string(),
            ContextValue::Result(handle) => format!("execution result #{}", handle.index()),
            ContextValue::Shared(_) => "shared value".to_string(),
        }
    }
}

impl std::fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name(), self.describe())
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Int(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<PathBuf> for ContextValue {
    fn from(value: PathBuf) -> Self {
        ContextValue::Path(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(value: Vec<String>) -> Self {
        ContextValue::List(value)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        ContextValue::Json(value)
    }
}

impl From<ResultHandle> for ContextValue {
    fn from(value: ResultHandle) -> Self {
        ContextValue::Result(value)
    }
}

/// Insertion-ordered key/value mapping scoped to one command
/// invocation. Created fresh per invocation by the runner and discarded
/// after.
#[derive(Debug, Default)]
pub struct CommandContext {
    entries: Vec<(String, ContextValue)>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Replacing keeps the key's original
    /// position so iteration order stays stable.
    pub fn put(&mut self, key: &str, value: impl Into<ContextValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
