use super::models::{EventFailure, ScheduleEvent};
use crate::error::{malformed_event_error, AppResult, Error};
use crate::utils::time::parse_date_only;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Event record as the model emits it; any field may be missing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    summary: Option<String>,
    location: Option<String>,
    description: Option<String>,
    color_id: Option<Value>,
    start: Option<RawEventDate>,
    end: Option<RawEventDate>,
}

#[derive(Debug, Deserialize)]
struct RawEventDate {
    date: Option<String>,
}

/// Result of normalizing one model response
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    /// Valid events, in response order
    pub events: Vec<ScheduleEvent>,
    /// Records that were rejected
    pub dropped: Vec<EventFailure>,
}

/// Locate the JSON array in a model response: first `[` through last `]`
pub fn locate_json_array(text: &str) -> AppResult<&str> {
    let start = text.find('[').ok_or(Error::NoJsonFound)?;
    let end = text.rfind(']').ok_or(Error::NoJsonFound)?;
    if end < start {
        return Err(Error::NoJsonFound);
    }
    Ok(&text[start..=end])
}

/// Parse a model response into validated events.
///
/// Fails with `NoJsonFound` when the text has no bracketed array and with
/// `Serialization` when the bracketed text is not JSON. Individual bad
/// records end up in `dropped`.
pub fn normalize_response(text: &str, fallback_color: Option<&str>) -> AppResult<NormalizeOutcome> {
    let candidate = locate_json_array(text)?;
    debug!("Located JSON candidate of {} bytes", candidate.len());
    let value: Value = serde_json::from_str(candidate)?;
    normalize_value(value, fallback_color)
}

/// Normalize a parsed JSON value holding either one record or an array of them
pub fn normalize_value(value: Value, fallback_color: Option<&str>) -> AppResult<NormalizeOutcome> {
    let records = match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        other => {
            return Err(malformed_event_error(&format!(
                "expected an event object or array, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut outcome = NormalizeOutcome::default();
    for record in records {
        let label = record_label(&record);
        match normalize_record(record, fallback_color) {
            Ok(event) => outcome.events.push(event),
            Err(e) => {
                warn!("Dropping event '{}': {}", label, e);
                outcome.dropped.push(EventFailure {
                    summary: label,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Validate one record
fn normalize_record(record: Value, fallback_color: Option<&str>) -> AppResult<ScheduleEvent> {
    if !record.is_object() {
        return Err(malformed_event_error(&format!(
            "expected an event object, got {}",
            json_kind(&record)
        )));
    }

    let raw: RawEvent = serde_json::from_value(record)
        .map_err(|e| malformed_event_error(&format!("unexpected field type: {}", e)))?;

    let start = required_date(raw.start.as_ref(), "start")?;
    let end = required_date(raw.end.as_ref(), "end")?;

    let color_id = match raw.color_id {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => fallback_color.map(str::to_string),
    };

    ScheduleEvent::new(
        raw.summary.unwrap_or_default(),
        non_empty(raw.location),
        non_empty(raw.description),
        color_id,
        start,
        end,
    )
}

fn required_date(field: Option<&RawEventDate>, name: &str) -> AppResult<chrono::NaiveDate> {
    let raw = field
        .and_then(|d| d.date.as_deref())
        .ok_or_else(|| malformed_event_error(&format!("missing {}.date", name)))?;
    parse_date_only(raw)
        .ok_or_else(|| malformed_event_error(&format!("invalid {}.date '{}'", name, raw)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn record_label(record: &Value) -> String {
    record
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("<no summary>")
        .to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
