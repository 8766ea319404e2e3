#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use firstbutton::components::extraction::{Document, EventExtractor};
use firstbutton::components::google_calendar::models::{
    ExtendedProperties, DEDUPE_KEY_PROPERTY,
};
use firstbutton::components::google_calendar::{
    CalendarApi, CredentialProvider, Credentials, EventBody, EventPage, InsertedEvent, ListQuery,
    RemoteEvent, StoredToken, TokenStore,
};
use firstbutton::components::schedule::ScheduleEvent;
use firstbutton::config::Config;
use firstbutton::error::{AppResult, Error};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Configuration with dummy secrets for tests
pub fn test_config() -> Config {
    Config {
        gemini_api_key: "test_gemini_key".to_string(),
        gemini_model: "gemini-flash-latest".to_string(),
        gemini_api_base: "http://127.0.0.1:1".to_string(),
        google_client_id: "test_client_id".to_string(),
        google_client_secret: "test_client_secret".to_string(),
        google_token_url: "http://127.0.0.1:1/token".to_string(),
        google_auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
        google_userinfo_url: "http://127.0.0.1:1/userinfo".to_string(),
        base_url: "http://localhost:8000".to_string(),
        calendar_api_base: "http://127.0.0.1:1".to_string(),
        calendar_id: "primary".to_string(),
        list_page_size: 250,
        request_timeout_secs: 5,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        dist_dir: "dist".to_string(),
        bind_address: "127.0.0.1".to_string(),
        port: 8000,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn event(summary: &str, description: &str, start: NaiveDate, end: NaiveDate) -> ScheduleEvent {
    ScheduleEvent::new(
        summary,
        None,
        Some(description.to_string()),
        Some("5".to_string()),
        start,
        end,
    )
    .unwrap()
}

pub fn valid_credentials() -> Credentials {
    Credentials::new("test_access_token", Some(Utc::now().timestamp() + 3600))
}

/// Remote event carrying a dedupe key
pub fn remote_with_key(id: &str, key: &str) -> RemoteEvent {
    let mut private = HashMap::new();
    private.insert(DEDUPE_KEY_PROPERTY.to_string(), key.to_string());
    RemoteEvent {
        id: Some(id.to_string()),
        summary: None,
        extended_properties: Some(ExtendedProperties {
            private: Some(private),
        }),
    }
}

/// How a mocked insert should fail
#[derive(Debug, Clone, Copy)]
pub enum InsertFailure {
    Conflict,
    Other,
}

/// In-memory calendar recording every call made against it
#[derive(Default)]
pub struct MockCalendar {
    existing: Vec<RemoteEvent>,
    fail_list: bool,
    insert_failures: HashMap<String, InsertFailure>,
    list_queries: Mutex<Vec<ListQuery>>,
    insert_calls: Mutex<Vec<EventBody>>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the calendar with events
    pub fn with_existing(mut self, events: Vec<RemoteEvent>) -> Self {
        self.existing = events;
        self
    }

    /// Make every list request fail
    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Make inserts of the given summary fail
    pub fn fail_insert(mut self, summary: &str, failure: InsertFailure) -> Self {
        self.insert_failures.insert(summary.to_string(), failure);
        self
    }

    pub async fn list_queries(&self) -> Vec<ListQuery> {
        self.list_queries.lock().await.clone()
    }

    pub async fn insert_calls(&self) -> Vec<EventBody> {
        self.insert_calls.lock().await.clone()
    }
}

#[async_trait]
impl CalendarApi for MockCalendar {
    async fn list_events(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        query: &ListQuery,
    ) -> AppResult<EventPage> {
        self.list_queries.lock().await.push(query.clone());

        if self.fail_list {
            return Err(Error::CalendarQuery("HTTP 401 Unauthorized".to_string()));
        }

        // Page tokens are offsets into the stored events
        let offset = query
            .page_token
            .as_deref()
            .map(|token| token.parse::<usize>().unwrap())
            .unwrap_or(0);
        let end = (offset + query.max_results as usize).min(self.existing.len());

        Ok(EventPage {
            items: self.existing[offset..end].to_vec(),
            next_page_token: (end < self.existing.len()).then(|| end.to_string()),
        })
    }

    async fn insert_event(
        &self,
        _credentials: &Credentials,
        _calendar_id: &str,
        body: &EventBody,
    ) -> AppResult<InsertedEvent> {
        let mut calls = self.insert_calls.lock().await;
        calls.push(body.clone());

        match self.insert_failures.get(&body.summary) {
            Some(InsertFailure::Conflict) => Err(Error::Conflict(body.summary.clone())),
            Some(InsertFailure::Other) => {
                Err(Error::Insert("HTTP 500 - backend error".to_string()))
            }
            None => Ok(InsertedEvent {
                id: format!("evt{}", calls.len()),
                html_link: None,
            }),
        }
    }
}

/// Credential provider returning fixed credentials
pub struct StaticCredentials {
    credentials: Option<Credentials>,
    calls: AtomicUsize,
}

impl StaticCredentials {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials_for(&self, user: &str) -> AppResult<Credentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.credentials
            .clone()
            .ok_or_else(|| Error::Credentials(format!("No token stored for {}", user)))
    }
}

/// Extractor returning canned model output
pub struct FixedExtractor {
    response: String,
}

impl FixedExtractor {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl EventExtractor for FixedExtractor {
    async fn extract_events(&self, _document: &Document) -> AppResult<String> {
        Ok(self.response.clone())
    }
}

/// In-memory token store recording every write
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, StoredToken>>,
    saves: Mutex<Vec<(String, StoredToken)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with a token for a user
    pub async fn with_token(self, user: &str, token: StoredToken) -> Self {
        self.tokens.lock().await.insert(user.to_string(), token);
        self
    }

    pub async fn get(&self, user: &str) -> Option<StoredToken> {
        self.tokens.lock().await.get(user).cloned()
    }

    pub async fn saves(&self) -> Vec<(String, StoredToken)> {
        self.saves.lock().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self, user: &str) -> AppResult<Option<StoredToken>> {
        Ok(self.tokens.lock().await.get(user).cloned())
    }

    async fn save(&self, user: &str, token: &StoredToken) -> AppResult<()> {
        self.saves
            .lock()
            .await
            .push((user.to_string(), token.clone()));
        self.tokens
            .lock()
            .await
            .insert(user.to_string(), token.clone());
        Ok(())
    }
}
