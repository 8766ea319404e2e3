mod client;
pub mod models;
pub mod oauth;
pub mod token;

pub use client::GoogleCalendarClient;
pub use models::{EventBody, EventPage, InsertedEvent, ListQuery, RemoteEvent};
pub use oauth::{OAuthClient, TokenResponse};
pub use token::{
    CredentialProvider, Credentials, RedisTokenStore, StoredToken, TokenService, TokenStore,
};

use crate::error::AppResult;
use async_trait::async_trait;

/// Calendar operations the reconciler needs
#[async_trait]
pub trait CalendarApi: Send + Sync + 'static {
    /// Fetch one page of events in a time window
    async fn list_events(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        query: &ListQuery,
    ) -> AppResult<EventPage>;

    /// Insert an event. A duplicate detected by the calendar is `Error::Conflict`.
    async fn insert_event(
        &self,
        credentials: &Credentials,
        calendar_id: &str,
        body: &EventBody,
    ) -> AppResult<InsertedEvent>;
}
