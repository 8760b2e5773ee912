//! Declarative context-to-command binding with fail-fast validation.
//!
//! A command declares its inputs as a table of bindings, each naming a
//! context key, an optional validation policy and a setter that moves
//! the looked-up value into the command's field. `initialize` walks the
//! table and aborts on the first missing key, validation failure or
//! type mismatch with an error naming the key, the command and the
//! offending value.

use std::path::PathBuf;

use crate::command::context::{CommandContext, ContextValue};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::execution::result::ResultHandle;

type SetterResult = std::result::Result<(), String>;

/// Validation applied to a bound value before assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Value must be present and not null.
    NotNull,
    /// Value must be present, not null, and not an empty text, list,
    /// map, json container or path.
    NotEmpty,
}

/// One entry of a command's binding table.
pub struct Binding<'a> {
    key: &'static str,
    policy: Option<ValidationPolicy>,
    setter: Box<dyn FnMut(&ContextValue) -> SetterResult + 'a>,
}

impl<'a> Binding<'a> {
    /// Binding whose value is validated against `policy` before
    /// assignment.
    pub fn required(
        key: &'static str,
        policy: ValidationPolicy,
        setter: Box<dyn FnMut(&ContextValue) -> SetterResult + 'a>,
    ) -> Self {
        Self {
            key,
            policy: Some(policy),
            setter,
        }
    }

    /// Binding without a validation policy. The key must still be
    /// present in the context; the value may be null.
    pub fn optional(
        key: &'static str,
        setter: Box<dyn FnMut(&ContextValue) -> SetterResult + 'a>,
    ) -> Self {
        Self {
            key,
            policy: None,
            setter,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

/// Commands initialized from a context expose their binding table
/// through this trait.
pub trait Bindable {
    fn bindings(&mut self) -> Vec<Binding<'_>>;
}

/// Bind every declared field of `command` from `context`.
///
/// Fails with [`Error::CommandInitializationFailed`] on the first
/// missing key, validation failure or setter mismatch.
pub fn initialize<C>(context: &CommandContext, command: &mut C) -> Result<()>
where
    C: Command + Bindable,
{
    let command_name = command.name();

    for mut binding in command.bindings() {
        let value = context.get(binding.key).ok_or_else(|| {
            Error::CommandInitializationFailed(format!(
                "Context key [{}] declared by command [{}] was not found in the context",
                binding.key, command_name
            ))
        })?;

        if let Some(policy) = binding.policy {
            validate_value(value, policy).map_err(|reason| {
                Error::CommandInitializationFailed(format!(
                    "Validation of context key [{}] on command [{}] failed for value [{}]: {}",
                    binding.key,
                    command_name,
                    value.describe(),
                    reason
                ))
            })?;
        }

        (binding.setter)(value).map_err(|reason| {
            Error::CommandInitializationFailed(format!(
                "Assignment of context key [{}] on command [{}] failed for value [{}]: {}",
                binding.key,
                command_name,
                value.describe(),
                reason
            ))
        })?;
    }

    Ok(())
}

/// Dispatch a value to the validator for `policy`.
pub fn validate_value(value: &ContextValue, policy: ValidationPolicy) -> SetterResult {
    match policy {
        ValidationPolicy::NotNull => validate_not_null(value),
        ValidationPolicy::NotEmpty => validate_not_empty(value),
    }
}

fn validate_not_null(value: &ContextValue) -> SetterResult {
    match value {
        ContextValue::Null => Err("value is null".to_string()),
        _ => Ok(()),
    }
}

fn validate_not_empty(value: &ContextValue) -> SetterResult {
    validate_not_null(value)?;

    match value {
        ContextValue::Text(text) if text.is_empty() => Err("text value is empty".to_string()),
        ContextValue::List(list) if list.is_empty() => Err("list value is empty".to_string()),
        ContextValue::Map(map) if map.is_empty() => Err("map value is empty".to_string()),
        ContextValue::Json(json) if json_is_empty(json) => {
            Err("json value is empty".to_string())
        }
        ContextValue::Path(path) => {
            if path.as_os_str().is_empty() {
                return Err("path value is empty".to_string());
            }
            match path.file_name() {
                Some(name) if !name.is_empty() => Ok(()),
                _ => Err("path value has no file name".to_string()),
            }
        }
        _ => Ok(()),
    }
}

fn json_is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(text) => text.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::Object(entries) => entries.is_empty(),
        _ => false,
    }
}

/// Setter adapters moving context values into command fields.
pub mod bind {
    use super::*;

    pub fn text(slot: &mut String) -> Box<dyn FnMut(&ContextValue) -> SetterResult + '_> {
        Box::new(move |value| match value {
            ContextValue::Text(text) => {
                *slot = text.clone();
                Ok(())
            }
            other => Err(format!("expected text value, found {}", other.type_name())),
        })
    }

    pub fn list(slot: &mut Vec<String>) -> Box<dyn FnMut(&ContextValue) -> SetterResult + '_> {
        Box::new(move |value| match value {
            ContextValue::List(items) => {
                *slot = items.clone();
                Ok(())
            }
            other => Err(format!("expected list value, found {}", other.type_name())),
        })
    }

    /// Millisecond quantity from an int value; null binds as absent.
    pub fn millis(slot: &mut Option<u64>) -> Box<dyn FnMut(&ContextValue) -> SetterResult + '_> {
        Box::new(move |value| match value {
            ContextValue::Null => {
                *slot = None;
                Ok(())
            }
            ContextValue::Int(raw) if *raw >= 0 => {
                *slot = Some(*raw as u64);
                Ok(())
            }
            ContextValue::Int(raw) => Err(format!("negative millisecond value {}", raw)),
            other => Err(format!("expected int value, found {}", other.type_name())),
        })
    }

    /// Path from a path value; null binds as absent.
    pub fn optional_path(
        slot: &mut Option<PathBuf>,
    ) -> Box<dyn FnMut(&ContextValue) -> SetterResult + '_> {
        Box::new(move |value| match value {
            ContextValue::Null => {
                *slot = None;
                Ok(())
            }
            ContextValue::Path(path) => {
                *slot = Some(path.clone());
                Ok(())
            }
            other => Err(format!("expected path value, found {}", other.type_name())),
        })
    }

    pub fn result(
        slot: &mut Option<ResultHandle>,
    ) -> Box<dyn FnMut(&ContextValue) -> SetterResult + '_> {
        Box::new(move |value| match value {
            ContextValue::Result(handle) => {
                *slot = Some(*handle);
                Ok(())
            }
            other => Err(format!(
                "expected execution result value, found {}",
                other.type_name()
            )),
        })
    }
}
