use super::models::{EventBody, EventPage, InsertedEvent, ListQuery};
use super::token::Credentials;
use super::CalendarApi;
use crate::config::Config;
use crate::error::{calendar_query_error, insert_error, AppResult, Error};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Google Calendar REST client
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Create a client from the application config
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.calendar_api_base))
    }

    /// Create a client around an existing HTTP client
    pub fn with_client(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url, String> {
        let url_str = format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        );
        Url::parse(&url_str).map_err(|e| format!("Failed to parse URL: {}", e))
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_events(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        query: &ListQuery,
    ) -> AppResult<EventPage> {
        let mut url = self
            .events_url(calendar_id)
            .map_err(|e| calendar_query_error(&e))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("timeMin", &query.time_min);
            pairs.append_pair("timeMax", &query.time_max);
            pairs.append_pair("showDeleted", "false");
            pairs.append_pair("singleEvents", "true");
            pairs.append_pair("maxResults", &query.max_results.to_string());
            if let Some(token) = &query.page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        debug!("Listing events: {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(|e| calendar_query_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(calendar_query_error(&format!(
                "Failed to fetch events: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json::<EventPage>()
            .await
            .map_err(|e| calendar_query_error(&format!("Failed to parse events response: {}", e)))
    }

    async fn insert_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        body: &EventBody,
    ) -> AppResult<InsertedEvent> {
        let url = self.events_url(calendar_id).map_err(|e| insert_error(&e))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&credentials.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| insert_error(&format!("Failed to insert event: {}", e)))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Error::Conflict(format!(
                "'{}' already exists: {}",
                body.summary, error_body
            )));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(insert_error(&format!("HTTP {} - {}", status, error_body)));
        }

        response
            .json::<InsertedEvent>()
            .await
            .map_err(|e| insert_error(&format!("Failed to parse insert response: {}", e)))
    }
}
