//! Record extraction from a resolved fetch value.

use serde_json::{Map, Value};

use crate::envelope::{classify, resolve, Layer, RECORD_KEYS};
use crate::models::{JsonKind, Record, ShapeObservation};

/// Why no record list was found at a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMiss {
    /// A record key was present but its value is not an array.
    NonListField { key: &'static str, found: JsonKind },
    /// The result object carries none of the record keys.
    NoRecordKey,
    /// Neither the result nor the unwrapped fetch value can hold records.
    NotAContainer(JsonKind),
}

/// Records pulled out of a fetch value, plus the diagnostics describing how.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<Record>,
    /// Diagnostic entries, keyed for the debug report.
    pub debug: Map<String, Value>,
}

/// Extract the record list from a fetch step's output.
///
/// Never fails: any shape mismatch yields an empty list and an explanatory debug entry.
pub fn extract(fetch: &Value) -> Extraction {
    let mut debug = Map::new();
    debug.insert("fetch".to_string(), ShapeObservation::of(fetch).to_value());

    let unwrapped = resolve(fetch);
    debug.insert("fetch_trace".to_string(), unwrapped.trace_value());
    debug.insert(
        "fetch_unwrapped".to_string(),
        ShapeObservation::of(unwrapped.value).to_value(),
    );
    let mut depth_exhausted = unwrapped.depth_exhausted;

    // A non-null `result` field beats the unwrapped object itself; legacy layouts put the
    // record list directly on the fetch value.
    let result = match unwrapped.value {
        Value::Object(map) => {
            let candidate = match map.get("result") {
                Some(result) if !result.is_null() => result,
                _ => unwrapped.value,
            };
            let resolved = resolve(candidate);
            debug.insert("result_trace".to_string(), resolved.trace_value());
            depth_exhausted |= resolved.depth_exhausted;
            Some(resolved.value)
        }
        _ => None,
    };
    debug.insert(
        "result".to_string(),
        result.map_or(Value::Null, |value| ShapeObservation::of(value).to_value()),
    );
    if depth_exhausted {
        debug.insert("depth_exhausted".to_string(), Value::Bool(true));
    }

    let raw: &[Value] = match locate_list(result, unwrapped.value) {
        Ok((source, items)) => {
            debug.insert("records_key".to_string(), Value::String(source.to_string()));
            items
        }
        Err(miss) => {
            record_miss(&mut debug, &miss);
            &[]
        }
    };

    let records: Vec<Record> = raw
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect();

    let dropped = raw.len() - records.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} non-object entries from record list", dropped);
    }
    debug.insert("raw_list_len".to_string(), Value::from(raw.len()));
    debug.insert("dropped_non_objects".to_string(), Value::from(dropped));
    debug.insert("records_count".to_string(), Value::from(records.len()));

    Extraction { records, debug }
}

/// Find the record list and name where it came from.
///
/// Precedence: record keys on the result object, then the result itself when it is an
/// array, then the unwrapped fetch value when it is a bare array.
pub fn locate_list<'a>(
    result: Option<&'a Value>,
    unwrapped: &'a Value,
) -> Result<(&'static str, &'a [Value]), ListMiss> {
    match result.map(classify) {
        Some(Layer::ObjectWithRecords(map)) => records_field(map),
        Some(Layer::BareArray(items)) => Ok(("<result>", items)),
        // Wrappers only survive here when resolution hit the depth cap.
        Some(Layer::Envelope(_))
        | Some(Layer::SingleKeyWrapper(_))
        | Some(Layer::Opaque(Value::Object(_))) => Err(ListMiss::NoRecordKey),
        _ => match classify(unwrapped) {
            Layer::BareArray(items) => Ok(("<fetch>", items)),
            _ => Err(ListMiss::NotAContainer(JsonKind::of(
                result.unwrap_or(unwrapped),
            ))),
        },
    }
}

fn records_field(map: &Map<String, Value>) -> Result<(&'static str, &[Value]), ListMiss> {
    let (key, value) = RECORD_KEYS
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
        .ok_or(ListMiss::NoRecordKey)?;

    match value {
        Value::Array(items) => Ok((key, items.as_slice())),
        other => Err(ListMiss::NonListField {
            key,
            found: JsonKind::of(other),
        }),
    }
}

fn record_miss(debug: &mut Map<String, Value>, miss: &ListMiss) {
    match miss {
        ListMiss::NonListField { key, found } => {
            tracing::warn!("Record field '{}' is {}, expected array", key, found);
            debug.insert("records_key".to_string(), Value::String(key.to_string()));
            debug.insert(
                "data_non_list_type".to_string(),
                Value::String(found.to_string()),
            );
        }
        ListMiss::NoRecordKey => {
            tracing::warn!("Result object has none of {:?}", RECORD_KEYS);
            debug.insert(
                "records_missing".to_string(),
                Value::String(format!("no non-null {} key on result", RECORD_KEYS.join("/"))),
            );
        }
        ListMiss::NotAContainer(kind) => {
            tracing::warn!("Fetch value resolved to {}, no record list", kind);
            debug.insert(
                "records_missing".to_string(),
                Value::String(format!("resolved value is {}", kind)),
            );
        }
    }
}
