use crate::components::schedule::ScheduleEvent;
use crate::utils::time::format_date_only;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the private extended property holding the dedupe key
pub const DEDUPE_KEY_PROPERTY: &str = "dedupeKey";

/// All-day date as the Calendar API expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: String,
}

/// Extended properties attached to a calendar event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<HashMap<String, String>>,
}

/// Request body for inserting an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    pub start: EventDate,
    pub end: EventDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

impl EventBody {
    /// Dedupe key carried in the private extended properties, if any
    pub fn dedupe_key(&self) -> Option<&str> {
        self.extended_properties
            .as_ref()
            .and_then(|props| props.private.as_ref())
            .and_then(|private| private.get(DEDUPE_KEY_PROPERTY))
            .map(String::as_str)
    }
}

impl From<&ScheduleEvent> for EventBody {
    fn from(event: &ScheduleEvent) -> Self {
        let extended_properties = event.dedupe_key().map(|key| {
            let mut private = HashMap::new();
            private.insert(DEDUPE_KEY_PROPERTY.to_string(), key.to_string());
            ExtendedProperties {
                private: Some(private),
            }
        });

        Self {
            summary: event.summary().to_string(),
            location: event.location().map(str::to_string),
            description: event.description().map(str::to_string),
            color_id: event.color_id().map(str::to_string),
            start: EventDate {
                date: format_date_only(event.start()),
            },
            end: EventDate {
                date: format_date_only(event.end()),
            },
            extended_properties,
        }
    }
}

/// Event as returned by the list endpoint, reduced to what we read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub extended_properties: Option<ExtendedProperties>,
}

impl RemoteEvent {
    pub fn dedupe_key(&self) -> Option<&str> {
        self.extended_properties
            .as_ref()
            .and_then(|props| props.private.as_ref())
            .and_then(|private| private.get(DEDUPE_KEY_PROPERTY))
            .map(String::as_str)
    }
}

/// One page of the list endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub items: Vec<RemoteEvent>,
    pub next_page_token: Option<String>,
}

/// Response of the insert endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// RFC 3339 lower bound
    pub time_min: String,
    /// RFC 3339 upper bound (exclusive)
    pub time_max: String,
    pub max_results: u32,
    pub page_token: Option<String>,
}
