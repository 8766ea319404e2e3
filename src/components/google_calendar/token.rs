use super::oauth::{OAuthClient, TokenResponse};
use crate::config::Config;
use crate::error::{credentials_error, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Tokens expiring within this many seconds are refreshed up front
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Redis key prefix for stored user tokens
const TOKEN_KEY_PREFIX: &str = "firstbutton:token:";

/// Access credentials for one calendar user
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    /// Expiry as a UTC timestamp, if known
    pub expires_at: Option<i64>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, expires_at: Option<i64>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Check that the credentials can be used right now
    pub fn validate(&self) -> AppResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(credentials_error("Access token is empty"));
        }
        if let Some(expiry) = self.expires_at {
            if expiry <= Utc::now().timestamp() {
                return Err(credentials_error("Access token has expired"));
            }
        }
        Ok(())
    }
}

/// Supplies valid, already refreshed credentials for a user
#[async_trait]
pub trait CredentialProvider: Send + Sync + 'static {
    async fn credentials_for(&self, user: &str) -> AppResult<Credentials>;
}

/// Token record kept per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<i64>,
}

impl StoredToken {
    /// Build the record for a token response. Google omits the refresh
    /// token on repeat grants, so the previous one is kept in that case.
    pub fn from_response(
        response: TokenResponse,
        previous: Option<&StoredToken>,
        now: i64,
    ) -> Self {
        let refresh_token = response
            .refresh_token
            .or_else(|| previous.and_then(|token| token.refresh_token.clone()));

        Self {
            access_token: response.access_token,
            refresh_token,
            expires_at: Some(now + response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS)),
        }
    }

    /// Whether the access token should be refreshed before use
    pub fn needs_refresh(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expiry) => expiry - REFRESH_MARGIN_SECS <= now,
            None => false,
        }
    }

    /// Whether the access token can no longer be used
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

impl From<StoredToken> for Credentials {
    fn from(token: StoredToken) -> Self {
        Credentials::new(token.access_token, token.expires_at)
    }
}

/// Persistence for per-user tokens
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    async fn load(&self, user: &str) -> AppResult<Option<StoredToken>>;

    async fn save(&self, user: &str, token: &StoredToken) -> AppResult<()>;
}

/// Token store keeping one JSON record per user in Redis
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl RedisTokenStore {
    /// Connect to Redis. The connection manager reconnects on its own.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        info!("Using Redis token store at {}", config.redis_url);

        let client = RedisClient::open(config.redis_url.as_str())?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    fn key_for(user: &str) -> String {
        format!("{}{}", TOKEN_KEY_PREFIX, user)
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn load(&self, user: &str) -> AppResult<Option<StoredToken>> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.get(Self::key_for(user)).await?;

        stored
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| {
                    credentials_error(&format!("Failed to parse stored token: {}", e))
                })
            })
            .transpose()
    }

    async fn save(&self, user: &str, token: &StoredToken) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(Self::key_for(user), serde_json::to_string(token)?)
            .await?;
        Ok(())
    }
}

/// Signs users in and hands out their refreshed credentials
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    oauth: OAuthClient,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, oauth: OAuthClient) -> Self {
        Self { store, oauth }
    }

    /// Consent page URL for a new sign-in
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        self.oauth.authorization_url(state)
    }

    /// Finish a sign-in: exchange the code, look up the account email and
    /// store the tokens under it. Returns the email.
    pub async fn complete_sign_in(&self, code: &str) -> AppResult<String> {
        let response = self.oauth.exchange_code(code).await?;
        let email = self.oauth.user_email(&response.access_token).await?;

        let previous = self.store.load(&email).await?;
        let now = Utc::now().timestamp();
        let token = StoredToken::from_response(response, previous.as_ref(), now);
        if token.refresh_token.is_none() {
            warn!("No refresh token for {}, sign-in lasts until expiry", email);
        }
        self.store.save(&email, &token).await?;

        info!("Stored tokens for {}", email);
        Ok(email)
    }

    async fn refresh(
        &self,
        user: &str,
        token: &StoredToken,
        refresh_token: &str,
    ) -> AppResult<StoredToken> {
        info!("Access token for {} expires soon, refreshing", user);

        let response = self.oauth.refresh(refresh_token).await?;
        let now = Utc::now().timestamp();
        let refreshed = StoredToken::from_response(response, Some(token), now);
        self.store.save(user, &refreshed).await?;

        info!("Stored refreshed token for {}", user);
        Ok(refreshed)
    }
}

#[async_trait]
impl CredentialProvider for TokenService {
    async fn credentials_for(&self, user: &str) -> AppResult<Credentials> {
        let token = self
            .store
            .load(user)
            .await?
            .ok_or_else(|| credentials_error(&format!("No token stored for {}", user)))?;

        let now = Utc::now().timestamp();
        if !token.needs_refresh(now) {
            return Ok(token.into());
        }

        if let Some(refresh_token) = token.refresh_token.clone() {
            return Ok(self.refresh(user, &token, &refresh_token).await?.into());
        }
        if token.is_expired(now) {
            return Err(credentials_error(
                "Access token expired and no refresh token is stored, sign in again",
            ));
        }

        warn!("Token for {} expires soon and cannot be refreshed", user);
        Ok(token.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn token(refresh_token: Option<&str>, expires_at: Option<i64>) -> StoredToken {
        StoredToken {
            access_token: "a".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at,
        }
    }

    #[test]
    fn test_needs_refresh() {
        let now = 1_000_000;

        assert!(token(Some("r"), Some(now - 10)).needs_refresh(now));
        assert!(token(Some("r"), Some(now + REFRESH_MARGIN_SECS)).needs_refresh(now));
        assert!(!token(Some("r"), Some(now + 3600)).needs_refresh(now));
        assert!(!token(Some("r"), None).needs_refresh(now));
    }

    #[test]
    fn test_is_expired() {
        let now = 1_000_000;

        assert!(token(None, Some(now)).is_expired(now));
        assert!(!token(None, Some(now + 30)).is_expired(now));
        assert!(!token(None, None).is_expired(now));
    }

    #[test]
    fn test_from_response_keeps_previous_refresh_token() {
        let previous = token(Some("old_refresh"), Some(10));
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: Some(3599),
        };

        let merged = StoredToken::from_response(response.clone(), Some(&previous), 1_000);
        assert_eq!(merged.access_token, "new");
        assert_eq!(merged.refresh_token.as_deref(), Some("old_refresh"));
        assert_eq!(merged.expires_at, Some(4_599));

        let fresh = StoredToken::from_response(
            TokenResponse {
                refresh_token: Some("new_refresh".to_string()),
                expires_in: None,
                ..response
            },
            Some(&previous),
            1_000,
        );
        assert_eq!(fresh.refresh_token.as_deref(), Some("new_refresh"));
        assert_eq!(fresh.expires_at, Some(1_000 + DEFAULT_EXPIRES_IN_SECS));
    }

    #[test]
    fn test_validate_credentials() {
        let future = Utc::now().timestamp() + 3600;
        let past = Utc::now().timestamp() - 1;

        assert!(Credentials::new("token", Some(future)).validate().is_ok());
        assert!(Credentials::new("token", None).validate().is_ok());
        assert!(matches!(
            Credentials::new("", None).validate(),
            Err(Error::Credentials(_))
        ));
        assert!(matches!(
            Credentials::new("token", Some(past)).validate(),
            Err(Error::Credentials(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let output = format!("{:?}", Credentials::new("ya29.secret", None));
        assert!(!output.contains("ya29.secret"));
    }

    #[test]
    fn test_stored_token_json_shape() {
        let json = serde_json::to_value(token(Some("r"), Some(42))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"access_token": "a", "refresh_token": "r", "expires_at": 42})
        );
    }
}
