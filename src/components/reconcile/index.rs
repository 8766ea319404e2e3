use crate::components::google_calendar::{CalendarApi, Credentials, ListQuery};
use crate::components::schedule::{InsertionBatch, ScheduleEvent};
use crate::error::{calendar_query_error, AppResult};
use crate::utils::time::{format_date_only, midnight_utc};
use chrono::{Duration, NaiveDate};
use std::collections::HashSet;
use tracing::{debug, info};

/// Date span `[start, end)` queried for existing events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Smallest window covering the given events, `None` when there are none
    pub fn covering<'a>(events: impl IntoIterator<Item = &'a ScheduleEvent>) -> Option<Self> {
        events.into_iter().fold(None, |window, event| {
            Some(match window {
                None => DateWindow {
                    start: event.start(),
                    end: event.end(),
                },
                Some(DateWindow { start, end }) => DateWindow {
                    start: start.min(event.start()),
                    end: end.max(event.end()),
                },
            })
        })
    }

    /// Lower bound as an RFC 3339 timestamp
    pub fn time_min(&self) -> String {
        midnight_utc(self.start)
    }

    /// Upper bound as an RFC 3339 timestamp.
    ///
    /// An empty window (only zero-length events) is widened to one day, the
    /// list endpoint rejects `timeMax == timeMin`.
    pub fn time_max(&self) -> String {
        if self.end > self.start {
            midnight_utc(self.end)
        } else {
            midnight_utc(self.start + Duration::days(1))
        }
    }
}

/// Dedupe keys already present in the destination calendar
#[derive(Debug, Clone, Default)]
pub struct ExistingKeysIndex {
    keys: HashSet<String>,
}

impl ExistingKeysIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Add a key, returning false if it was already present
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Build the index for a batch.
    ///
    /// Queries the calendar over the window spanned by the batch's common
    /// events, following page tokens to the end. A batch without common
    /// events yields an empty index and no request is made.
    pub async fn fetch(
        calendar: &dyn CalendarApi,
        credentials: &Credentials,
        calendar_id: &str,
        batch: &InsertionBatch,
        page_size: u32,
    ) -> AppResult<Self> {
        let window = match DateWindow::covering(batch.common_events()) {
            Some(window) => window,
            None => {
                debug!("No common events in batch, skipping existence query");
                return Ok(Self::new());
            }
        };

        info!(
            "Querying existing events from {} to {}",
            format_date_only(window.start),
            format_date_only(window.end)
        );

        let mut index = Self::new();
        let mut query = ListQuery {
            time_min: window.time_min(),
            time_max: window.time_max(),
            max_results: page_size,
            page_token: None,
        };
        let mut pages = 0usize;

        loop {
            let page = calendar.list_events(credentials, calendar_id, &query).await?;
            pages += 1;

            for item in &page.items {
                if let Some(key) = item.dedupe_key() {
                    index.insert(key);
                }
            }

            match page.next_page_token {
                Some(token) if query.page_token.as_deref() == Some(token.as_str()) => {
                    return Err(calendar_query_error(&format!(
                        "Calendar returned the same page token twice: {}",
                        token
                    )));
                }
                Some(token) => query.page_token = Some(token),
                None => break,
            }
        }

        if index.is_empty() {
            debug!("No common events already in the calendar across {} page(s)", pages);
        } else {
            info!(
                "Found {} existing dedupe keys across {} page(s)",
                index.len(),
                pages
            );
        }
        Ok(index)
    }
}

impl FromIterator<String> for ExistingKeysIndex {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(summary: &str, start: NaiveDate, end: NaiveDate) -> ScheduleEvent {
        ScheduleEvent::new(summary, None, Some("holiday".to_string()), None, start, end).unwrap()
    }

    #[test]
    fn test_window_covers_all_events() {
        let events = [
            event("Labor Day", date(2025, 9, 1), date(2025, 9, 10)),
            event("Mid Break", date(2025, 9, 5), date(2025, 9, 12)),
        ];
        let window = DateWindow::covering(events.iter()).unwrap();

        assert_eq!(window.start, date(2025, 9, 1));
        assert_eq!(window.end, date(2025, 9, 12));
        assert_eq!(window.time_min(), "2025-09-01T00:00:00Z");
        assert_eq!(window.time_max(), "2025-09-12T00:00:00Z");
    }

    #[test]
    fn test_window_of_nothing() {
        assert_eq!(DateWindow::covering(std::iter::empty::<&ScheduleEvent>()), None);
    }

    #[test]
    fn test_zero_length_window_is_widened() {
        let events = [event("Snow Day", date(2025, 2, 3), date(2025, 2, 3))];
        let window = DateWindow::covering(events.iter()).unwrap();
        assert_eq!(window.time_max(), "2025-02-04T00:00:00Z");
    }

    #[test]
    fn test_index_insert_reports_duplicates() {
        assert!(ExistingKeysIndex::new().is_empty());

        let mut index: ExistingKeysIndex = vec!["k1".to_string()].into_iter().collect();
        assert!(!index.is_empty());
        assert!(index.contains("k1"));
        assert!(!index.insert("k1"));
        assert!(index.insert("k2"));
        assert_eq!(index.len(), 2);
    }
}
