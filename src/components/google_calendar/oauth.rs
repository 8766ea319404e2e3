//! Google OAuth web-server flow: consent URL, code exchange, refresh and
//! the signed-in user's email.

use crate::config::Config;
use crate::error::{credentials_error, AppResult};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Scopes requested at sign-in
pub const SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/userinfo.email",
    "openid",
];

/// Path Google redirects back to after consent
pub const CALLBACK_PATH: &str = "/api/auth/callback";

/// Token endpoint response for both code exchange and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only sent on the first consent, or when consent is forced
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

/// Client for the Google OAuth endpoints
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client: Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| credentials_error(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            auth_url: config.google_auth_url.clone(),
            token_url: config.google_token_url.clone(),
            userinfo_url: config.google_userinfo_url.clone(),
            redirect_uri: format!("{}{}", config.base_url, CALLBACK_PATH),
        })
    }

    /// Consent page URL. Offline access with forced consent so Google
    /// hands out a refresh token.
    pub fn authorization_url(&self, state: &str) -> AppResult<String> {
        let scope = SCOPES.join(" ");
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| credentials_error(&format!("Failed to build authorization URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> AppResult<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        self.token_request(&params, "exchange authorization code").await
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        self.token_request(&params, "refresh token").await
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        action: &str,
    ) -> AppResult<TokenResponse> {
        debug!("Token request: {}", action);

        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| credentials_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(credentials_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| credentials_error(&format!("Failed to parse token response: {}", e)))
    }

    /// Email address of the account the access token belongs to
    pub async fn user_email(&self, access_token: &str) -> AppResult<String> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| credentials_error(&format!("Failed to fetch user info: {}", e)))?;

        if !response.status().is_success() {
            return Err(credentials_error(&format!(
                "Failed to fetch user info: HTTP {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| credentials_error(&format!("Failed to parse user info: {}", e)))?;

        info.email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| credentials_error("Google did not return an email address"))
    }
}
