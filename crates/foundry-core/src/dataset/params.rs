//! Action parameters that resolve per item
//!
//! A parameter is a literal, a key looked up on the item or context, or a
//! function computed from both. Keys use dotted paths:
//!
//! - `context.input_dir`, `context.<value>`: the run context
//! - `item.id`, `item.<field>`: the item (the `item.` prefix is optional)
//!
//! Segments after the first traverse nested JSON objects.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::{Context, DatasetItem};
use crate::error::{FoundryError, FoundryResult};

type ComputeFn = dyn Fn(&DatasetItem, &Context) -> Option<Value> + Send + Sync;

#[derive(Clone)]
pub enum Param {
    Literal(Value),
    Key(String),
    Computed(Arc<ComputeFn>),
}

impl Param {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&DatasetItem, &Context) -> Option<Value> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Resolve against an item; JSON `null` counts as absent
    pub fn resolve(&self, item: &DatasetItem, context: &Context) -> Option<ParamValue> {
        let value = match self {
            Self::Literal(value) => Some(value.clone()),
            Self::Key(key) => lookup(key, item, context),
            Self::Computed(f) => f(item, context),
        };
        value.filter(|v| !v.is_null()).map(ParamValue)
    }

    /// Resolve, failing with a configuration error when absent
    pub fn resolve_required(
        &self,
        item: &DatasetItem,
        context: &Context,
        name: &str,
    ) -> FoundryResult<ParamValue> {
        self.resolve(item, context).ok_or_else(|| {
            FoundryError::config_with_context(
                format!("Missing required parameter '{}' ({:?})", name, self),
                format!("Resolving parameters for item '{}'", item.id()),
            )
        })
    }
}

fn lookup(key: &str, item: &DatasetItem, context: &Context) -> Option<Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;

    let root = match first {
        "context" => context.value(segments.next()?)?,
        "item" => {
            let field = segments.next()?;
            if field == "id" {
                Value::String(item.id().to_string())
            } else {
                item.get(field)?
            }
        }
        field => item.get(field)?,
    };

    segments.try_fold(root, |value, segment| match value {
        Value::Object(mut map) => map.remove(segment),
        _ => None,
    })
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "Literal({})", value),
            Self::Key(key) => write!(f, "Key({})", key),
            Self::Computed(_) => f.write_str("Computed"),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Literal(Value::String(value.to_string()))
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Literal(Value::String(value))
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Self::Literal(Value::Bool(value))
    }
}

impl From<u64> for Param {
    fn from(value: u64) -> Self {
        Self::Literal(Value::from(value))
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// A resolved parameter value with typed accessors
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue(pub Value);

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Require a string; numbers are not coerced
    pub fn as_string(&self, name: &str) -> FoundryResult<String> {
        match &self.0 {
            Value::String(s) => Ok(s.clone()),
            other => Err(type_error(name, "a string", other)),
        }
    }

    pub fn as_bool(&self, name: &str) -> FoundryResult<bool> {
        match &self.0 {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s == "true" || s == "false" => Ok(s == "true"),
            other => Err(type_error(name, "a boolean", other)),
        }
    }

    pub fn as_u64(&self, name: &str) -> FoundryResult<u64> {
        match &self.0 {
            Value::Number(n) => n.as_u64().ok_or_else(|| type_error(name, "a non-negative integer", &self.0)),
            Value::String(s) => s
                .parse()
                .map_err(|_| type_error(name, "a non-negative integer", &self.0)),
            other => Err(type_error(name, "a non-negative integer", other)),
        }
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

fn type_error(name: &str, expected: &str, got: &Value) -> FoundryError {
    FoundryError::config(format!("Parameter '{}' must be {}, got {}", name, expected, got))
}
