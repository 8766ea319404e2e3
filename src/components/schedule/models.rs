use super::classify::is_common;
use super::dedupe::compute_dedupe_key;
use crate::error::{malformed_event_error, AppResult};
use crate::utils::time::format_date_only;
use chrono::NaiveDate;
use serde::Serialize;

/// One all-day calendar entry extracted from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvent {
    summary: String,
    location: Option<String>,
    description: Option<String>,
    color_id: Option<String>,
    start: NaiveDate,
    /// Exclusive end date (day after the last day)
    end: NaiveDate,
    /// Present iff the event is common
    dedupe_key: Option<String>,
}

impl ScheduleEvent {
    /// Build a validated event, classifying it and computing its dedupe key
    pub fn new(
        summary: impl Into<String>,
        location: Option<String>,
        description: Option<String>,
        color_id: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Self> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(malformed_event_error("summary is empty"));
        }
        if end < start {
            return Err(malformed_event_error(&format!(
                "end date {} is before start date {} for '{}'",
                format_date_only(end),
                format_date_only(start),
                summary
            )));
        }

        let dedupe_key = if is_common(description.as_deref()) {
            Some(compute_dedupe_key(&summary, start, end))
        } else {
            None
        };

        Ok(Self {
            summary,
            location,
            description,
            color_id,
            start,
            end,
            dedupe_key,
        })
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn color_id(&self) -> Option<&str> {
        self.color_id.as_deref()
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether this is a shared event (holiday, break, no class)
    pub fn is_common(&self) -> bool {
        self.dedupe_key.is_some()
    }

    pub fn dedupe_key(&self) -> Option<&str> {
        self.dedupe_key.as_deref()
    }
}

/// The events of one upload, processed together in order
#[derive(Debug, Clone, Default)]
pub struct InsertionBatch {
    events: Vec<ScheduleEvent>,
}

impl InsertionBatch {
    pub fn new(events: Vec<ScheduleEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events tagged as common, in batch order
    pub fn common_events(&self) -> impl Iterator<Item = &ScheduleEvent> {
        self.events.iter().filter(|event| event.is_common())
    }
}

impl From<Vec<ScheduleEvent>> for InsertionBatch {
    fn from(events: Vec<ScheduleEvent>) -> Self {
        Self::new(events)
    }
}

impl IntoIterator for InsertionBatch {
    type Item = ScheduleEvent;
    type IntoIter = std::vec::IntoIter<ScheduleEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// An event that could not be processed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventFailure {
    pub summary: String,
    pub error: String,
}
