// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation requests and their canonical cache keys

use crate::error::InvokeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named arguments of an operation, ordered by key.
pub type Arguments = BTreeMap<String, Value>;

/// Settled result of one operation attempt.
pub type Outcome<T> = Result<T, InvokeError>;

/// A named remote call with its arguments. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    name: String,
    #[serde(default)]
    arguments: Arguments,
}

impl OperationRequest {
    /// Build a request, rejecting blank operation names.
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Result<Self, InvokeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InvokeError::InvalidArgument("operation name must not be empty".into()));
        }
        Ok(Self { name, arguments })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Deterministic key for memoizing this call.
    ///
    /// `{name}:{json}` where the JSON has object keys sorted at every depth, so
    /// semantically identical arguments always produce the same key.
    pub fn cache_key(&self) -> String {
        let mut canonical = String::from('{');
        for (i, (key, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                canonical.push(',');
            }
            canonical.push_str(&Value::String(key.clone()).to_string());
            canonical.push(':');
            write_canonical(&mut canonical, value);
        }
        canonical.push('}');
        format!("{}:{}", self.name, canonical)
    }
}

/// Build an [`Arguments`] map from `key => value` pairs.
///
/// ```ignore
/// let args = relay_core::args! { "id" => 1, "verbose" => true };
/// ```
#[macro_export]
macro_rules! args {
    () => { $crate::Arguments::new() };
    ($( $key:expr => $value:expr ),+ $(,)?) => {{
        let mut arguments = $crate::Arguments::new();
        $( arguments.insert(String::from($key), $crate::__serde_json::json!($value)); )+
        arguments
    }};
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
