//! Pipeline context lookup.

use serde_json::{Map, Value};

use crate::models::JsonKind;

/// Where the context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// The `context` field of the input document.
    Payload,
    /// The serialized fallback from the environment.
    Env,
    /// Neither source was usable.
    None,
}

impl ContextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextSource::Payload => "payload",
            ContextSource::Env => "env",
            ContextSource::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedContext {
    pub steps: Map<String, Value>,
    pub source: ContextSource,
    pub debug: Map<String, Value>,
}

impl LoadedContext {
    /// Output of the named upstream step, recording its absence in `debug`.
    pub fn step(&mut self, name: &str) -> Value {
        match self.steps.get(name) {
            Some(value) => value.clone(),
            None => {
                tracing::warn!("Context has no '{}' entry", name);
                self.debug.insert(
                    "fetch_missing".to_string(),
                    Value::String(format!("context has no '{}' entry", name)),
                );
                Value::Null
            }
        }
    }
}

/// Load the step context from the input document, falling back to `fallback` (the raw
/// environment value) when the document carries no non-empty `context` object.
///
/// Never fails; problems with the fallback end up in the returned debug map.
pub fn load_context(payload: &Value, fallback: Option<&str>) -> LoadedContext {
    let mut debug = Map::new();

    if !payload.is_object() {
        debug.insert(
            "payload_type".to_string(),
            Value::String(JsonKind::of(payload).to_string()),
        );
    }

    let (steps, source) = match payload.get("context") {
        Some(Value::Object(map)) if !map.is_empty() => (map.clone(), ContextSource::Payload),
        _ => match fallback {
            Some(raw) => {
                debug.insert("context_env_bytes".to_string(), Value::from(raw.len()));
                match parse_fallback(raw) {
                    Ok(map) => {
                        debug.insert("context_env_parse".to_string(), Value::from("ok"));
                        (map, ContextSource::Env)
                    }
                    Err(FallbackError::NotObject(kind)) => {
                        tracing::warn!("Fallback context is {}, not an object", kind);
                        debug.insert("context_env_parse".to_string(), Value::from("not_object"));
                        debug.insert(
                            "context_env_error".to_string(),
                            Value::String(format!("expected object, got {}", kind)),
                        );
                        (Map::new(), ContextSource::None)
                    }
                    Err(FallbackError::Parse(message)) => {
                        tracing::warn!("Fallback context is not valid JSON: {}", message);
                        debug.insert("context_env_parse".to_string(), Value::from("error"));
                        debug.insert("context_env_error".to_string(), Value::String(message));
                        (Map::new(), ContextSource::None)
                    }
                }
            }
            None => (Map::new(), ContextSource::None),
        },
    };

    debug.insert(
        "context_source".to_string(),
        Value::from(source.as_str()),
    );
    debug.insert(
        "context_keys".to_string(),
        Value::Array(steps.keys().cloned().map(Value::String).collect()),
    );
    tracing::info!(
        source = source.as_str(),
        steps = steps.len(),
        "Context loaded"
    );

    LoadedContext {
        steps,
        source,
        debug,
    }
}

enum FallbackError {
    Parse(String),
    NotObject(JsonKind),
}

fn parse_fallback(raw: &str) -> Result<Map<String, Value>, FallbackError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(FallbackError::NotObject(JsonKind::of(&other))),
        Err(e) => Err(FallbackError::Parse(e.to_string())),
    }
}
