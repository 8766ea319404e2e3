use crate::components::extraction::GeminiExtractor;
use crate::components::google_calendar::{
    GoogleCalendarClient, OAuthClient, RedisTokenStore, TokenService,
};
use crate::components::{Reconciler, ScheduleImporter};
use crate::config::Config;
use crate::error::{AppResult, Error};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(config)),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Long-lived collaborators shared by the server's handlers
pub struct Services {
    pub importer: ScheduleImporter,
    pub accounts: Arc<TokenService>,
}

/// Connect the token store and build the import pipeline
pub async fn build_services(config: &Config) -> AppResult<Services> {
    let store = Arc::new(RedisTokenStore::connect(config).await?);
    let accounts = Arc::new(TokenService::new(store, OAuthClient::new(config)?));

    let extractor = Arc::new(GeminiExtractor::new(config)?);
    let calendar = Arc::new(GoogleCalendarClient::new(config)?);

    let reconciler = Reconciler::new(calendar, config);
    info!("Importing into calendar {}", reconciler.calendar_id());

    let importer = ScheduleImporter::new(extractor, accounts.clone(), reconciler);

    Ok(Services { importer, accounts })
}
