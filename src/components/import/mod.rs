//! Upload pipeline: document -> model text -> events -> calendar.

use crate::components::extraction::{Document, EventExtractor};
use crate::components::google_calendar::CredentialProvider;
use crate::components::reconcile::{ReconcileReport, Reconciler};
use crate::components::schedule::{
    normalize_response, EventFailure, InsertionBatch, NormalizeOutcome,
};
use crate::error::{AppResult, Error};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of importing one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportOutcome {
    /// Number of valid events extracted
    pub extracted: usize,
    /// Records rejected during normalization
    pub dropped: Vec<EventFailure>,
    /// Calendar result, absent when nothing was extracted
    pub report: Option<ReconcileReport>,
}

/// Wires the extraction, credential and calendar collaborators together
#[derive(Clone)]
pub struct ScheduleImporter {
    extractor: Arc<dyn EventExtractor>,
    credentials: Arc<dyn CredentialProvider>,
    reconciler: Reconciler,
}

impl ScheduleImporter {
    pub fn new(
        extractor: Arc<dyn EventExtractor>,
        credentials: Arc<dyn CredentialProvider>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            extractor,
            credentials,
            reconciler,
        }
    }

    /// Import one document into the user's calendar
    pub async fn import(&self, document: &Document, user: &str) -> AppResult<ImportOutcome> {
        let text = self.extractor.extract_events(document).await?;

        let NormalizeOutcome { events, dropped } =
            match normalize_response(&text, Some(&document.color_id)) {
                Ok(outcome) => outcome,
                Err(Error::NoJsonFound) => {
                    warn!("No JSON array in model response for {}", document.file_name);
                    NormalizeOutcome::default()
                }
                Err(e) => return Err(e),
            };

        info!(
            "Extracted {} event(s) from {} ({} dropped)",
            events.len(),
            document.file_name,
            dropped.len()
        );

        if events.is_empty() {
            return Ok(ImportOutcome {
                extracted: 0,
                dropped,
                report: None,
            });
        }

        let credentials = self.credentials.credentials_for(user).await?;
        let extracted = events.len();
        let report = self
            .reconciler
            .reconcile(InsertionBatch::from(events), &credentials)
            .await?;

        Ok(ImportOutcome {
            extracted,
            dropped,
            report: Some(report),
        })
    }
}
