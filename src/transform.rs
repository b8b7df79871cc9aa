//! One transform run: input document in, markdown listing and debug report out.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::config::Config;
use crate::context::load_context;
use crate::errors::{AppError, ResultExt};
use crate::extractor::extract;
use crate::models::{Record, StatusReport};
use crate::render::render;

pub const LEADS_FILE: &str = "leads.md";
pub const DEBUG_FILE: &str = "leads_debug.json";

/// Everything a run produces before anything touches the filesystem.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadsReport {
    pub records: Vec<Record>,
    pub markdown: String,
    /// Full diagnostic trace; keys are sorted when serialized.
    pub debug: Map<String, Value>,
}

impl LeadsReport {
    pub fn records_count(&self) -> usize {
        self.records.len()
    }
}

/// Build the listing and debug report for one input document.
pub fn build_report(
    payload: &Value,
    fallback_context: Option<&str>,
    fetch_step: &str,
) -> LeadsReport {
    let mut context = load_context(payload, fallback_context);
    let fetch = context.step(fetch_step);

    let extraction = extract(&fetch);
    let markdown = render(&extraction.records);

    let mut debug = context.debug;
    debug.insert("fetch_step".to_string(), Value::String(fetch_step.to_string()));
    debug.extend(extraction.debug);

    LeadsReport {
        records: extraction.records,
        markdown,
        debug,
    }
}

/// Write `leads.md` and `leads_debug.json` under `dir`, creating it if needed.
///
/// Both files are staged next to their targets and only moved into place once both are
/// written, so a failed run never leaves a listing without its debug report.
pub fn write_outputs(dir: &Path, report: &LeadsReport) -> Result<Vec<PathBuf>, AppError> {
    let encoded = encode_debug(&report.debug)?;

    fs::create_dir_all(dir).with_path(dir)?;

    let leads_path = dir.join(LEADS_FILE);
    let debug_path = dir.join(DEBUG_FILE);
    let leads_staged = staging_path(&leads_path);
    let debug_staged = staging_path(&debug_path);

    let staged = fs::write(&leads_staged, report.markdown.as_bytes())
        .with_path(&leads_staged)
        .and_then(|_| fs::write(&debug_staged, encoded.as_bytes()).with_path(&debug_staged));
    if let Err(e) = staged {
        remove_quietly(&[leads_staged.as_path(), debug_staged.as_path()]);
        return Err(e);
    }

    if let Err(e) = fs::rename(&debug_staged, &debug_path).with_path(&debug_path) {
        remove_quietly(&[leads_staged.as_path(), debug_staged.as_path()]);
        return Err(e);
    }
    if let Err(e) = fs::rename(&leads_staged, &leads_path).with_path(&leads_path) {
        remove_quietly(&[leads_staged.as_path(), debug_path.as_path()]);
        return Err(e);
    }

    Ok(vec![leads_path, debug_path])
}

/// Pretty-printed debug report with keys sorted at every level, plus a trailing newline.
pub fn encode_debug(debug: &Map<String, Value>) -> Result<String, AppError> {
    let mut encoded =
        serde_json::to_string_pretty(&sort_object(debug)).map_err(AppError::Serialization)?;
    encoded.push('\n');
    Ok(encoded)
}

// Rebuilt through a BTreeMap so the order holds even if serde_json preserves insertion order.
fn sort_object(map: &Map<String, Value>) -> Value {
    let sorted: BTreeMap<&String, Value> = map.iter().map(|(k, v)| (k, sort_keys(v))).collect();
    Value::Object(sorted.into_iter().map(|(k, v)| (k.clone(), v)).collect())
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => sort_object(map),
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.tmp", name))
}

fn remove_quietly(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to clean up {}: {}", path.display(), e);
            }
        }
    }
}

/// Decode the input document from `reader`, build the report and write it out.
///
/// Only an undecodable input document or a failed write is an error.
pub fn run<R: Read>(reader: R, config: &Config) -> Result<StatusReport, AppError> {
    let payload: Value = serde_json::from_reader(reader).map_err(|e| {
        if e.is_io() {
            AppError::Io {
                path: PathBuf::from("-"),
                source: e.into(),
            }
        } else {
            AppError::InvalidInput(e)
        }
    })?;

    let report = build_report(
        &payload,
        config.fallback_context.as_deref(),
        &config.fetch_step,
    );
    tracing::info!("Extracted {} records", report.records_count());

    let files = write_outputs(&config.output_dir, &report)?;
    for file in &files {
        tracing::info!("Wrote {}", file.display());
    }

    Ok(StatusReport::success(
        files.iter().map(|p| p.display().to_string()).collect(),
        report.records_count(),
    ))
}
