//! Normalization of ClickHouse trace rows into the Tempo/OTLP JSON shape
//!
//! Rows are JSON objects as returned by ClickHouse `JSONEachRow` against the
//! OpenTelemetry exporter schema (`Timestamp`, `TraceId`, `SpanId`, ...).
//! Nested columns may arrive flattened (`"Events.Name": [...]`) or as an
//! object (`"Events": {"Name": [...]}`); both are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

// 2^63 as f64; anything at or beyond it does not fit an i64 nanosecond count.
const MAX_NANOS_F64: f64 = 9_223_372_036_854_775_808.0;

/// Tempo search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub traces: Vec<TraceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub root_service_name: String,
    pub root_trace_name: String,
    pub start_time_unix_nano: String,
    pub duration_ms: f64,
}

/// Tempo trace-by-id response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTrace {
    #[serde(rename = "traceID")]
    pub trace_id: String,
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub resource: Resource,
    pub scope_spans: Vec<ScopeSpans>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeSpans {
    pub scope: Scope,
    pub spans: Vec<CanonicalSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSpan {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: i32,
    pub start_time_unix_nano: String,
    pub end_time_unix_nano: String,
    pub attributes: Vec<KeyValue>,
    pub status: SpanStatus,
    pub events: Vec<SpanEvent>,
    pub links: Vec<SpanLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanStatus {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEvent {
    pub time_unix_nano: String,
    pub name: String,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanLink {
    pub trace_id: String,
    pub span_id: String,
    pub trace_state: String,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    pub string_value: String,
}

impl KeyValue {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: value.into(),
            },
        }
    }
}

/// OTLP span kind; unknown strings map to `Unspecified`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Unspecified = 0,
    Internal = 1,
    Server = 2,
    Client = 3,
    Producer = 4,
    Consumer = 5,
}

impl SpanKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SPAN_KIND_INTERNAL" | "Internal" => SpanKind::Internal,
            "SPAN_KIND_SERVER" | "Server" => SpanKind::Server,
            "SPAN_KIND_CLIENT" | "Client" => SpanKind::Client,
            "SPAN_KIND_PRODUCER" | "Producer" => SpanKind::Producer,
            "SPAN_KIND_CONSUMER" | "Consumer" => SpanKind::Consumer,
            _ => SpanKind::Unspecified,
        }
    }
}

/// OTLP status code; unknown strings map to `Unset`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Unset = 0,
    Ok = 1,
    Error = 2,
}

impl StatusCode {
    pub fn from_name(name: &str) -> Self {
        match name {
            "STATUS_CODE_OK" | "Ok" => StatusCode::Ok,
            "STATUS_CODE_ERROR" | "Error" => StatusCode::Error,
            _ => StatusCode::Unset,
        }
    }
}

/// Map trace summary rows to a Tempo search response.
///
/// Any row without a usable timestamp fails the whole call.
pub fn to_tempo_search_response(rows: &[Value]) -> Result<SearchResponse> {
    let traces = rows
        .iter()
        .map(|row| {
            let timestamp = row
                .get("Timestamp")
                .filter(|v| !v.is_null())
                .or_else(|| row.get("MinTimestamp").filter(|v| !v.is_null()))
                .ok_or_else(|| {
                    Error::Normalization("Invalid query result: missing timestamp".to_string())
                })?;
            let duration_nanos = duration_nanos(row);

            Ok(TraceSummary {
                trace_id: str_field(row, "TraceId"),
                root_service_name: str_field(row, "ServiceName"),
                root_trace_name: str_field(row, "SpanName"),
                start_time_unix_nano: parse_timestamp_nanos(timestamp)?.to_string(),
                duration_ms: duration_nanos as f64 / 1e6,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SearchResponse { traces })
}

/// Map the span rows of one trace to a Tempo trace response.
///
/// Rows that cannot be transformed are skipped; the call fails only when
/// there are no rows or none of them survive.
pub fn to_tempo_trace_response(rows: &[Value], trace_id: &str) -> Result<CanonicalTrace> {
    if rows.is_empty() {
        return Err(Error::TraceNotFound(trace_id.to_string()));
    }

    let mut batches: Vec<(String, Batch)> = Vec::new();
    let mut transformed = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let span = match to_span(row) {
            Ok(span) => span,
            Err(e) => {
                warn!(trace_id, row = index, error = %e, "Skipping span row");
                continue;
            }
        };
        transformed += 1;

        let service = str_field(row, "ServiceName");
        let scope = Scope {
            name: str_field(row, "ScopeName"),
            version: str_field(row, "ScopeVersion"),
        };

        let index = if let Some(i) = batches.iter().position(|(s, _)| *s == service) {
            i
        } else {
            let resource = resource_for(row, &service);
            batches.push((
                service,
                Batch {
                    resource,
                    scope_spans: Vec::new(),
                },
            ));
            batches.len() - 1
        };
        let batch = &mut batches[index].1;

        match batch.scope_spans.iter_mut().find(|s| s.scope == scope) {
            Some(scope_spans) => scope_spans.spans.push(span),
            None => batch.scope_spans.push(ScopeSpans {
                scope,
                spans: vec![span],
            }),
        }
    }

    if transformed == 0 {
        return Err(Error::Normalization(format!(
            "Trace found but no valid spans could be transformed: {trace_id}"
        )));
    }

    Ok(CanonicalTrace {
        trace_id: trace_id.to_string(),
        batches: batches.into_iter().map(|(_, batch)| batch).collect(),
    })
}

/// Transform one span row
pub fn to_span(row: &Value) -> Result<CanonicalSpan> {
    let timestamp = row
        .get("Timestamp")
        .filter(|v| !v.is_null())
        .ok_or_else(|| Error::Normalization("Invalid query result: missing timestamp".to_string()))?;
    let start = parse_timestamp_nanos(timestamp)?;
    let end = start.saturating_add(i64::try_from(duration_nanos(row)).unwrap_or(i64::MAX));

    let parent_span_id = Some(str_field(row, "ParentSpanId")).filter(|p| !p.is_empty());

    Ok(CanonicalSpan {
        trace_id: str_field(row, "TraceId"),
        span_id: str_field(row, "SpanId"),
        parent_span_id,
        name: str_field(row, "SpanName"),
        kind: SpanKind::from_name(&str_field(row, "SpanKind")) as i32,
        start_time_unix_nano: start.to_string(),
        end_time_unix_nano: end.to_string(),
        attributes: attributes(row.get("SpanAttributes")),
        status: SpanStatus {
            code: StatusCode::from_name(&str_field(row, "StatusCode")) as i32,
            message: str_field(row, "StatusMessage"),
        },
        events: events(row),
        links: links(row),
    })
}

/// Nanoseconds since the epoch.
///
/// Strings are parsed as dates (RFC 3339, ClickHouse `DateTime64` text, or a
/// bare date, all UTC); numbers are epoch seconds.
pub fn parse_timestamp_nanos(value: &Value) -> Result<i64> {
    match value {
        Value::String(s) => parse_date_string(s)
            .and_then(|dt| dt.timestamp_nanos_opt())
            .ok_or_else(|| Error::Normalization(format!("Invalid timestamp: {s}"))),
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return secs
                    .checked_mul(1_000_000_000)
                    .ok_or_else(|| Error::Normalization(format!("Timestamp out of range: {n}")));
            }
            let nanos = (n.as_f64().unwrap_or(f64::NAN) * 1e9).round();
            if !nanos.is_finite() || nanos.abs() >= MAX_NANOS_F64 {
                return Err(Error::Normalization(format!("Timestamp out of range: {n}")));
            }
            Ok(nanos as i64)
        }
        other => Err(Error::Normalization(format!("Invalid timestamp: {other}"))),
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Duration` column in nanoseconds; ClickHouse quotes 64-bit integers
fn duration_nanos(row: &Value) -> u64 {
    match row.get("Duration") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn str_field(row: &Value, key: &str) -> String {
    value_to_string(row.get(key).unwrap_or(&Value::Null))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn resource_for(row: &Value, service: &str) -> Resource {
    let mut attrs = attributes(row.get("ResourceAttributes"));
    if !service.is_empty() && !attrs.iter().any(|kv| kv.key == "service.name") {
        attrs.insert(0, KeyValue::new("service.name", service));
    }
    Resource { attributes: attrs }
}

/// Attributes given as an object or as a list of `[key, value]` pairs
fn attributes(value: Option<&Value>) -> Vec<KeyValue> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| KeyValue::new(k.clone(), value_to_string(v)))
            .collect(),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Array(pair) if pair.len() == 2 => {
                    Some(KeyValue::new(value_to_string(&pair[0]), value_to_string(&pair[1])))
                }
                Value::Object(obj) => obj.get("key").map(|k| {
                    KeyValue::new(
                        value_to_string(k),
                        value_to_string(obj.get("value").unwrap_or(&Value::Null)),
                    )
                }),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| v.is_object() || v.is_array())
            .map(|v| attributes(Some(&v)))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Column `field` of nested column group `group`, in either layout
fn nested_column<'a>(row: &'a Value, group: &str, field: &str) -> &'a [Value] {
    row.get(format!("{group}.{field}"))
        .or_else(|| row.get(group).and_then(|g| g.get(field)))
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn events(row: &Value) -> Vec<SpanEvent> {
    let timestamps = nested_column(row, "Events", "Timestamp");
    let names = nested_column(row, "Events", "Name");
    let attrs = nested_column(row, "Events", "Attributes");

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let nanos = parse_timestamp_nanos(ts).ok()?;
            Some(SpanEvent {
                time_unix_nano: nanos.to_string(),
                name: names.get(i).map(value_to_string).unwrap_or_default(),
                attributes: attributes(attrs.get(i)),
            })
        })
        .collect()
}

fn links(row: &Value) -> Vec<SpanLink> {
    let trace_ids = nested_column(row, "Links", "TraceId");
    let span_ids = nested_column(row, "Links", "SpanId");
    let states = nested_column(row, "Links", "TraceState");
    let attrs = nested_column(row, "Links", "Attributes");

    trace_ids
        .iter()
        .enumerate()
        .map(|(i, trace_id)| SpanLink {
            trace_id: value_to_string(trace_id),
            span_id: span_ids.get(i).map(value_to_string).unwrap_or_default(),
            trace_state: states.get(i).map(value_to_string).unwrap_or_default(),
            attributes: attributes(attrs.get(i)),
        })
        .collect()
}
