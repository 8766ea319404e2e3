use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default Gemini model used for extraction
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-latest";
/// Default Gemini REST endpoint (model name and method are appended)
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Default Google Calendar REST endpoint
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
/// Default OAuth token endpoint for code exchange and refresh
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Default Google consent page
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Default endpoint returning the signed-in user's email
pub const DEFAULT_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
/// Largest page size the calendar list endpoint accepts
pub const MAX_LIST_PAGE_SIZE: u32 = 2500;
/// Default page size for the existence query
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 250;
/// Optional file with overrides for a subset of settings
pub const OVERRIDES_PATH: &str = "config/firstbutton.toml";

/// Main configuration, built once at startup and handed to every collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API key
    pub gemini_api_key: String,
    /// Gemini model name
    pub gemini_model: String,
    /// Gemini REST base URL
    pub gemini_api_base: String,
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// OAuth token endpoint
    pub google_token_url: String,
    /// OAuth consent page
    pub google_auth_url: String,
    /// OAuth userinfo endpoint
    pub google_userinfo_url: String,
    /// Public URL of the server, used for the OAuth redirect
    pub base_url: String,
    /// Google Calendar REST base URL
    pub calendar_api_base: String,
    /// Destination calendar
    pub calendar_id: String,
    /// Page size for listing existing events
    pub list_page_size: u32,
    /// Timeout for outgoing HTTP requests, in seconds
    pub request_timeout_secs: u64,
    /// Redis URL for stored OAuth tokens
    pub redis_url: String,
    /// Directory holding the built frontend
    pub dist_dir: String,
    /// Address the upload server binds to
    pub bind_address: String,
    /// Port the upload server listens on
    pub port: u16,
}

/// Settings that may be overridden from `config/firstbutton.toml`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigOverrides {
    pub calendar_id: Option<String>,
    pub list_page_size: Option<u32>,
    pub gemini_model: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from environment and the overrides file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let gemini_api_key =
            env::var("GOOGLE_GEMINI_API").map_err(|_| env_error("GOOGLE_GEMINI_API"))?;
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|_| env_error("Invalid PORT format"))?,
            Err(_) => 8000,
        };

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("Invalid REQUEST_TIMEOUT_SECS format"))?,
            Err(_) => 60,
        };

        let mut config = Config {
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            google_client_id,
            google_client_secret,
            google_token_url: DEFAULT_TOKEN_URL.to_string(),
            google_auth_url: DEFAULT_AUTH_URL.to_string(),
            google_userinfo_url: DEFAULT_USERINFO_URL.to_string(),
            base_url: env::var("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            calendar_api_base: DEFAULT_CALENDAR_API_BASE.to_string(),
            calendar_id: env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            request_timeout_secs,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            dist_dir: env::var("DIST_DIR").unwrap_or_else(|_| "dist".to_string()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
        };

        if Path::new(OVERRIDES_PATH).exists() {
            let content = fs::read_to_string(OVERRIDES_PATH)?;
            config.apply_overrides(&content)?;
        }

        Ok(config)
    }

    /// Apply TOML overrides on top of the current values
    pub fn apply_overrides(&mut self, content: &str) -> AppResult<()> {
        let overrides: ConfigOverrides = toml::from_str(content)?;

        if let Some(calendar_id) = overrides.calendar_id {
            if calendar_id.trim().is_empty() {
                return Err(config_error("calendar_id must not be empty"));
            }
            self.calendar_id = calendar_id;
        }
        if let Some(page_size) = overrides.list_page_size {
            self.list_page_size = page_size;
        }
        if let Some(model) = overrides.gemini_model {
            self.gemini_model = model;
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }

        Ok(())
    }

    /// Page size clamped to what the calendar API accepts
    pub fn effective_page_size(&self) -> u32 {
        self.list_page_size.clamp(1, MAX_LIST_PAGE_SIZE)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        gemini_api_key: "test_gemini_key".to_string(),
        gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
        gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        google_client_id: "test_client_id".to_string(),
        google_client_secret: "test_client_secret".to_string(),
        google_token_url: DEFAULT_TOKEN_URL.to_string(),
        google_auth_url: DEFAULT_AUTH_URL.to_string(),
        google_userinfo_url: DEFAULT_USERINFO_URL.to_string(),
        base_url: "http://localhost:8000".to_string(),
        calendar_api_base: DEFAULT_CALENDAR_API_BASE.to_string(),
        calendar_id: "primary".to_string(),
        list_page_size: DEFAULT_LIST_PAGE_SIZE,
        request_timeout_secs: 60,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        dist_dir: "dist".to_string(),
        bind_address: "127.0.0.1".to_string(),
        port: 8000,
    }
}
