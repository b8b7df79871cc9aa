//! Envelope resolution.
//!
//! Connector steps wrap their payload in zero or more `{success, result}` layers, and
//! some emit a bare `{"result": ...}` passthrough. [`resolve`] strips those layers and
//! records the shape of every value it inspected along the way.

use serde_json::{Map, Value};

use crate::models::ShapeObservation;

/// Maximum number of wrapper layers stripped by [`resolve`].
pub const MAX_UNWRAP_DEPTH: usize = 8;

/// Keys that may carry the record list, in lookup precedence order.
pub const RECORD_KEYS: [&str; 4] = ["data", "Data", "records", "Records"];

/// Classification of a JSON value by its wrapping role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layer<'a> {
    /// `{success: <bool>, result: <payload>, ...}`; holds the payload.
    Envelope(&'a Value),
    /// `{result: <payload>}` with no other keys; holds the payload.
    SingleKeyWrapper(&'a Value),
    /// A non-wrapper object carrying at least one non-null record key.
    ObjectWithRecords(&'a Map<String, Value>),
    BareArray(&'a [Value]),
    /// Anything else: scalars, null, and objects without record keys.
    Opaque(&'a Value),
}

impl<'a> Layer<'a> {
    /// Payload to continue with, if this value is a wrapper.
    pub fn inner(&self) -> Option<&'a Value> {
        match *self {
            Layer::Envelope(inner) | Layer::SingleKeyWrapper(inner) => Some(inner),
            _ => None,
        }
    }
}

pub fn classify(value: &Value) -> Layer<'_> {
    match value {
        Value::Object(map) => {
            if let (Some(Value::Bool(_)), Some(result)) = (map.get("success"), map.get("result")) {
                return Layer::Envelope(result);
            }
            if map.len() == 1 {
                if let Some(result) = map.get("result") {
                    return Layer::SingleKeyWrapper(result);
                }
            }
            if RECORD_KEYS
                .iter()
                .any(|key| matches!(map.get(*key), Some(v) if !v.is_null()))
            {
                Layer::ObjectWithRecords(map)
            } else {
                Layer::Opaque(value)
            }
        }
        Value::Array(items) => Layer::BareArray(items),
        _ => Layer::Opaque(value),
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    /// Innermost value reached.
    pub value: &'a Value,
    /// One observation per inspected value; the last one describes `value`.
    pub trace: Vec<ShapeObservation>,
    /// Set when unwrapping stopped at [`MAX_UNWRAP_DEPTH`] on a value that was still a wrapper.
    pub depth_exhausted: bool,
}

impl Resolution<'_> {
    pub fn unwrap_count(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }

    pub fn trace_value(&self) -> Value {
        Value::Array(self.trace.iter().map(ShapeObservation::to_value).collect())
    }
}

/// Strip envelope and single-key wrapper layers from `value`.
///
/// Never fails. A value that is not a wrapper comes back unchanged with a trace of one entry.
pub fn resolve(value: &Value) -> Resolution<'_> {
    let mut current = value;
    let mut trace = Vec::new();

    loop {
        trace.push(ShapeObservation::of(current));

        let Some(inner) = classify(current).inner() else {
            return Resolution {
                value: current,
                trace,
                depth_exhausted: false,
            };
        };

        if trace.len() > MAX_UNWRAP_DEPTH {
            tracing::warn!(
                "Envelope nesting exceeds {} layers, stopping resolution",
                MAX_UNWRAP_DEPTH
            );
            return Resolution {
                value: current,
                trace,
                depth_exhausted: true,
            };
        }

        tracing::debug!(depth = trace.len(), "Unwrapping result layer");
        current = inner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JsonKind;
    use serde_json::json;

    fn wrap(mut value: Value, layers: usize) -> Value {
        for _ in 0..layers {
            value = json!({"success": true, "result": value});
        }
        value
    }

    #[test]
    fn test_classify_envelope_requires_boolean_success() {
        let envelope = json!({"success": false, "result": 1, "message": "ok"});
        assert_eq!(classify(&envelope), Layer::Envelope(&json!(1)));

        let not_envelope = json!({"success": "true", "result": 1});
        assert_eq!(classify(&not_envelope), Layer::Opaque(&not_envelope));
    }

    #[test]
    fn test_classify_single_key_wrapper() {
        let wrapper = json!({"result": [1, 2]});
        assert_eq!(classify(&wrapper), Layer::SingleKeyWrapper(&json!([1, 2])));

        // A `result` next to other keys is not a passthrough.
        let value = json!({"result": [1], "status": 200});
        assert!(classify(&value).inner().is_none());
    }

    #[test]
    fn test_classify_records_and_arrays() {
        let value = json!({"Records": []});
        assert!(matches!(classify(&value), Layer::ObjectWithRecords(_)));
        assert!(matches!(classify(&json!([])), Layer::BareArray(items) if items.is_empty()));
        assert!(matches!(classify(&json!({"info": {}})), Layer::Opaque(_)));
        assert!(matches!(classify(&json!(null)), Layer::Opaque(_)));
    }

    #[test]
    fn test_classify_ignores_null_record_keys() {
        let nulls = json!({"data": null, "Records": null});
        assert_eq!(classify(&nulls), Layer::Opaque(&nulls));

        let mixed = json!({"data": null, "Records": [1]});
        assert!(matches!(classify(&mixed), Layer::ObjectWithRecords(_)));
    }

    #[test]
    fn test_resolve_fixed_point() {
        for value in [json!(null), json!(3), json!("x"), json!([]), json!({}), json!({"data": []})] {
            let resolution = resolve(&value);
            assert_eq!(resolution.value, &value);
            assert_eq!(resolution.trace.len(), 1);
            assert!(!resolution.depth_exhausted);
        }
    }

    #[test]
    fn test_resolve_nested_envelopes() {
        let value = wrap(json!({"data": [{"Name": "X"}]}), 3);
        let resolution = resolve(&value);

        assert_eq!(resolution.value, &json!({"data": [{"Name": "X"}]}));
        assert_eq!(resolution.trace.len(), 4);
        assert_eq!(resolution.unwrap_count(), 3);
        assert_eq!(resolution.trace[0].keys, Some(vec!["result".to_string(), "success".to_string()]));
    }

    #[test]
    fn test_resolve_mixed_wrappers() {
        let value = json!({"result": {"success": true, "result": {"result": [1]}}});
        let resolution = resolve(&value);
        assert_eq!(resolution.value, &json!([1]));
        assert_eq!(resolution.trace.len(), 4);
        assert_eq!(resolution.trace[3].kind, JsonKind::Array);
    }

    #[test]
    fn test_resolve_at_max_depth() {
        let value = wrap(json!([]), MAX_UNWRAP_DEPTH);
        let resolution = resolve(&value);
        assert_eq!(resolution.value, &json!([]));
        assert_eq!(resolution.trace.len(), MAX_UNWRAP_DEPTH + 1);
        assert!(!resolution.depth_exhausted);
    }

    #[test]
    fn test_resolve_stops_past_max_depth() {
        let value = wrap(json!([]), MAX_UNWRAP_DEPTH + 2);
        let resolution = resolve(&value);

        assert!(resolution.depth_exhausted);
        assert_eq!(resolution.trace.len(), MAX_UNWRAP_DEPTH + 1);
        assert_eq!(resolution.value, &wrap(json!([]), 2));
    }
}
