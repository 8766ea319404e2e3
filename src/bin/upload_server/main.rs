mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, get, post},
    Router,
};
use firstbutton::components::google_calendar::TokenService;
use firstbutton::components::ScheduleImporter;
use firstbutton::error::Error;
use firstbutton::startup;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::handlers::{
    api_not_found, callback_handler, health_handler, login_handler, upload_handler,
};

/// Upload size limit
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    /// Pipeline turning uploads into calendar events
    pub importer: Arc<ScheduleImporter>,
    /// Google sign-in and token storage
    pub accounts: Arc<TokenService>,
    /// Where the browser lands after signing in
    pub base_url: String,
}

/// Build the application router
pub fn router(state: AppState, dist_dir: &str) -> Router {
    let api = Router::new()
        .route("/api/auth/login", get(login_handler))
        .route("/api/auth/callback", get(callback_handler))
        .route("/api/schedule/upload", post(upload_handler))
        .route("/api/{*rest}", any(api_not_found))
        .route("/health", get(health_handler))
        .with_state(state);

    // Serve the built frontend, falling back to index.html for client-side routes
    let dist = Path::new(dist_dir);
    let app = if dist.exists() {
        let index = dist.join("index.html");
        api.fallback_service(ServeDir::new(dist).fallback(ServeFile::new(index)))
    } else {
        warn!("Frontend directory {} not found, serving API only", dist_dir);
        api
    };

    app.layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting schedule upload server");

    // Load configuration
    let config = startup::load_config()?;

    let services = startup::build_services(&config).await?;
    let state = AppState {
        importer: Arc::new(services.importer),
        accounts: services.accounts,
        base_url: config.base_url.clone(),
    };

    let app = router(state, &config.dist_dir);

    // Bind to address and run server
    let listener = tokio::net::TcpListener::bind((config.bind_address.as_str(), config.port))
        .await
        .map_err(Error::from)?;
    info!("Listening on {}:{}", config.bind_address, config.port);

    axum::serve(listener, app).await.map_err(Error::from)?;

    Ok(())
}
