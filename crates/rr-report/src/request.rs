//! Inbound report payloads.
//!
//! Parsing is lenient: any byte string produces a request. Bodies that are not
//! a JSON object fall back to an all-defaults structured report.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Title used when a freeform request carries none.
pub const DEFAULT_TITLE: &str = "Отчёт";

/// Department used when a structured request carries none.
pub const DEFAULT_DEPARTMENT: &str = "unknown";

/// A report request, discriminated by payload shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportRequest {
    /// `{title, text}`.
    Freeform(FreeformReport),
    /// `{department, kpis, open_rows}`.
    Structured(StructuredReport),
}

/// Title plus free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeformReport {
    pub title: String,
    pub text: String,
}

impl Default for FreeformReport {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            text: String::new(),
        }
    }
}

/// KPI counters for the summary panel. `None` renders as the placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total: Option<String>,
    pub open: Option<String>,
    pub open_high7: Option<String>,
    pub hosts: Option<String>,
    pub hosts_open: Option<String>,
}

/// One vulnerability finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilityRow {
    pub cvss: String,
    pub threat: String,
    pub threat_key: String,
    pub status: String,
    pub status_key: String,
    pub host: String,
    pub port: String,
    pub plugin: String,
    pub detected: String,
}

/// Department KPI report with a table of open findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredReport {
    pub department: String,
    pub kpis: Kpis,
    pub rows: Vec<VulnerabilityRow>,
}

impl Default for StructuredReport {
    fn default() -> Self {
        Self {
            department: DEFAULT_DEPARTMENT.to_string(),
            kpis: Kpis::default(),
            rows: Vec::new(),
        }
    }
}

impl Default for ReportRequest {
    fn default() -> Self {
        ReportRequest::Structured(StructuredReport::default())
    }
}

const STRUCTURED_KEYS: [&str; 3] = ["department", "kpis", "open_rows"];
const FREEFORM_KEYS: [&str; 2] = ["title", "text"];

impl ReportRequest {
    /// Parse a request body. Never fails.
    pub fn from_json_bytes(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self::from_object(&map),
            Ok(other) => {
                debug!(kind = json_kind(&other), "payload is not an object, using defaults");
                Self::default()
            }
            Err(e) => {
                debug!(error = %e, bytes = body.len(), "payload is not JSON, using defaults");
                Self::default()
            }
        }
    }

    /// Build a request from an already parsed JSON object.
    pub fn from_object(map: &Map<String, Value>) -> Self {
        if STRUCTURED_KEYS.iter().any(|k| map.contains_key(*k)) {
            ReportRequest::Structured(StructuredReport::from_object(map))
        } else if FREEFORM_KEYS.iter().any(|k| map.contains_key(*k)) {
            ReportRequest::Freeform(FreeformReport::from_object(map))
        } else {
            Self::default()
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportRequest::Freeform(_) => "freeform",
            ReportRequest::Structured(_) => "structured",
        }
    }
}

impl FreeformReport {
    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            title: non_empty_text(map.get("title")).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            text: scalar_text(map.get("text")).unwrap_or_default(),
        }
    }
}

impl StructuredReport {
    fn from_object(map: &Map<String, Value>) -> Self {
        let kpis = match map.get("kpis") {
            Some(Value::Object(k)) => Kpis {
                total: non_empty_text(k.get("total")),
                open: non_empty_text(k.get("open")),
                open_high7: non_empty_text(k.get("open_high7")),
                hosts: non_empty_text(k.get("hosts")),
                hosts_open: non_empty_text(k.get("hosts_open")),
            },
            _ => Kpis::default(),
        };

        let rows = match map.get("open_rows") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_object().map(VulnerabilityRow::from_object))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            department: non_empty_text(map.get("department"))
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
            kpis,
            rows,
        }
    }
}

impl VulnerabilityRow {
    fn from_object(map: &Map<String, Value>) -> Self {
        let field = |name: &str| scalar_text(map.get(name)).unwrap_or_default();
        Self {
            cvss: field("cvss"),
            threat: field("threat"),
            threat_key: field("threat_key"),
            status: field("status"),
            status_key: field("status_key"),
            host: field("host"),
            port: field("port"),
            plugin: field("plugin"),
            detected: field("detected"),
        }
    }
}

/// Strings as-is, numbers and booleans stringified, everything else absent.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    scalar_text(value).filter(|s| !s.trim().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
