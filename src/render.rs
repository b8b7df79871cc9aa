use serde_json::Value;

use crate::models::Record;

pub const TITLE: &str = "# Zoho Leads";
pub const EMPTY_PLACEHOLDER: &str = "(no records found)";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Fields consulted, in order, for a record's display name.
pub const DISPLAY_NAME_FIELDS: [&str; 3] = ["Full_Name", "Last_Name", "Name"];

/// Render records as a markdown bullet list under a fixed title.
pub fn render(records: &[Record]) -> String {
    let mut out = format!("{}\n\n", TITLE);

    if records.is_empty() {
        out.push_str(EMPTY_PLACEHOLDER);
        out.push('\n');
        return out;
    }

    for record in records {
        out.push_str("- ");
        out.push_str(&display_name(record));
        out.push('\n');
    }
    out
}

/// First usable name field, or `Unknown`.
pub fn display_name(record: &Record) -> String {
    DISPLAY_NAME_FIELDS
        .iter()
        .find_map(|field| record.get(*field).and_then(display_text))
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

// Empty strings and zero fall through to the next field, like the falsy checks upstream.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
