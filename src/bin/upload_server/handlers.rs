use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use firstbutton::components::extraction::Document;
use firstbutton::error::Error;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;

/// Cookie carrying the signed-in user's email
pub const USER_COOKIE: &str = "user_email";

/// Cookie holding the OAuth state between login and callback
pub const STATE_COOKIE: &str = "oauth_state";

const AUTH_COOKIE_PATH: &str = "/api/auth";

/// Error returned from API handlers as JSON
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "status": "error", "message": self.message })),
        )
            .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
            Error::Credentials(_) => StatusCode::FORBIDDEN,
            Error::Extraction(_) | Error::CalendarQuery(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, err.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Start a Google sign-in. Returns the consent URL and remembers the state.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let oauth_state = Uuid::new_v4().to_string();
    let url = state.accounts.authorization_url(&oauth_state)?;

    let cookie = Cookie::build((STATE_COOKIE, oauth_state))
        .path(AUTH_COOKIE_PATH)
        .http_only(true);

    Ok((jar.add(cookie), Json(json!({ "url": url }))))
}

/// Google redirects here after consent
pub async fn callback_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), ApiError> {
    if let Some(reason) = params.error {
        warn!("Sign-in declined: {}", reason);
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Sign-in failed: {}", reason),
        ));
    }

    let expected = jar.get(STATE_COOKIE).map(|cookie| cookie.value().to_string());
    if expected.is_none() || expected != params.state {
        warn!("Sign-in callback with mismatched state");
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Invalid sign-in state"));
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing authorization code"))?;

    let email = state.accounts.complete_sign_in(&code).await.map_err(|e| {
        error!("Sign-in failed: {}", e);
        ApiError::from(e)
    })?;
    info!("Signed in {}", email);

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path(AUTH_COOKIE_PATH))
        .add(Cookie::build((USER_COOKIE, email)).path("/"));

    Ok((jar, Redirect::to(&format!("{}/", state.base_url))))
}

/// Handler for schedule uploads
pub async fn upload_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let user = jar
        .get(USER_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Sign in to upload schedules"))?;

    let mut uploaded_file = None;
    let mut event_color = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == "uploaded_file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
            uploaded_file = Some((file_name, data.to_vec()));
        } else if field_name == "event_color" {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;
            event_color = Some(value);
        }
    }

    let (file_name, bytes) = uploaded_file
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing uploaded_file field"))?;
    let event_color = event_color
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing event_color field"))?;

    let upload_id = Uuid::new_v4();
    info!(
        "Upload {} from {}: {} ({} bytes)",
        upload_id,
        user,
        file_name,
        bytes.len()
    );

    let document = Document::new(file_name, bytes, event_color)?;

    let outcome = state.importer.import(&document, &user).await.map_err(|e| {
        error!("Upload {} failed: {}", upload_id, e);
        ApiError::from(e)
    })?;

    let Some(report) = outcome.report else {
        warn!("Upload {}: no schedules found", upload_id);
        return Ok(Json(json!({
            "status": "error",
            "message": "No schedules were found",
            "dropped": outcome.dropped,
        })));
    };

    info!(
        "Upload {} done: {} inserted, {} skipped, {} failed",
        upload_id,
        report.inserted_count,
        report.skipped_count,
        report.errors.len()
    );

    Ok(Json(json!({
        "status": "success",
        "count": outcome.extracted,
        "inserted": report.inserted_count,
        "skipped": report.skipped_count,
        "errors": report.errors,
        "dropped": outcome.dropped,
        "user": user,
    })))
}

/// Unknown API routes
pub async fn api_not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}

// Handler for API health check
pub async fn health_handler() -> &'static str {
    "OK"
}
