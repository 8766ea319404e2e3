use super::index::ExistingKeysIndex;
use crate::components::google_calendar::{CalendarApi, Credentials, EventBody};
use crate::components::schedule::{EventFailure, InsertionBatch};
use crate::error::Error;
use serde::Serialize;
use tracing::{error, info, warn};

/// Outcome of reconciling one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub inserted_count: usize,
    pub skipped_count: usize,
    pub errors: Vec<EventFailure>,
}

/// Insert a batch in order, skipping common events that already exist.
///
/// Keys are added to the index before the insert call so a later duplicate
/// in the same batch is skipped. A conflict from the calendar counts as a
/// skip; other failures are recorded and the batch carries on.
pub async fn insert_batch(
    calendar: &dyn CalendarApi,
    credentials: &Credentials,
    calendar_id: &str,
    batch: InsertionBatch,
    index: &mut ExistingKeysIndex,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for event in batch {
        if let Some(key) = event.dedupe_key() {
            if !index.insert(key) {
                info!("Skipping '{}': already exists", event.summary());
                report.skipped_count += 1;
                continue;
            }
        }

        let body = EventBody::from(&event);
        match calendar.insert_event(credentials, calendar_id, &body).await {
            Ok(inserted) => {
                info!("Inserted '{}' ({})", event.summary(), inserted.id);
                report.inserted_count += 1;
            }
            Err(Error::Conflict(reason)) => {
                warn!("Skipping '{}': calendar reported a conflict: {}", event.summary(), reason);
                report.skipped_count += 1;
            }
            Err(e) => {
                error!("Failed to insert '{}': {}", event.summary(), e);
                report.errors.push(EventFailure {
                    summary: event.summary().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
