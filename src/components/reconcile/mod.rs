//! Inserting a batch of events into the calendar without duplicating
//! common events.

pub mod index;
pub mod inserter;

pub use index::{DateWindow, ExistingKeysIndex};
pub use inserter::{insert_batch, ReconcileReport};

use crate::components::google_calendar::{CalendarApi, Credentials};
use crate::components::schedule::InsertionBatch;
use crate::config::Config;
use crate::error::AppResult;
use std::sync::Arc;
use tracing::info;

/// Reconciles extracted batches against one destination calendar
#[derive(Clone)]
pub struct Reconciler {
    calendar: Arc<dyn CalendarApi>,
    calendar_id: String,
    page_size: u32,
}

impl Reconciler {
    pub fn new(calendar: Arc<dyn CalendarApi>, config: &Config) -> Self {
        Self {
            calendar,
            calendar_id: config.calendar_id.clone(),
            page_size: config.effective_page_size(),
        }
    }

    pub fn calendar_id(&self) -> &str {
        &self.calendar_id
    }

    /// Insert the batch, skipping common events already in the calendar.
    ///
    /// Invalid credentials and a failed existence query abort before any
    /// insert is attempted.
    pub async fn reconcile(
        &self,
        batch: InsertionBatch,
        credentials: &Credentials,
    ) -> AppResult<ReconcileReport> {
        credentials.validate()?;

        info!(
            "Reconciling {} event(s) into calendar {}",
            batch.len(),
            self.calendar_id
        );

        let mut index = ExistingKeysIndex::fetch(
            self.calendar.as_ref(),
            credentials,
            &self.calendar_id,
            &batch,
            self.page_size,
        )
        .await?;

        let report = insert_batch(
            self.calendar.as_ref(),
            credentials,
            &self.calendar_id,
            batch,
            &mut index,
        )
        .await;

        info!(
            "Reconciled batch: {} inserted, {} skipped, {} failed",
            report.inserted_count,
            report.skipped_count,
            report.errors.len()
        );
        Ok(report)
    }
}
