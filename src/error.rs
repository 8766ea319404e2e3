use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the importer
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Malformed event: {0}")]
    #[diagnostic(code(firstbutton::malformed_event))]
    MalformedEvent(String),

    #[error("No JSON array found in model response")]
    #[diagnostic(code(firstbutton::no_json_found))]
    NoJsonFound,

    #[error("Calendar query error: {0}")]
    #[diagnostic(
        code(firstbutton::calendar_query),
        help("no events were inserted because the existing events could not be listed")
    )]
    CalendarQuery(String),

    #[error("Calendar conflict: {0}")]
    #[diagnostic(code(firstbutton::conflict))]
    Conflict(String),

    #[error("Calendar insert error: {0}")]
    #[diagnostic(code(firstbutton::insert))]
    Insert(String),

    #[error("Credentials error: {0}")]
    #[diagnostic(code(firstbutton::credentials))]
    Credentials(String),

    #[error("Extraction error: {0}")]
    #[diagnostic(code(firstbutton::extraction))]
    Extraction(String),

    #[error("Unsupported file: {0}")]
    #[diagnostic(
        code(firstbutton::unsupported_file),
        help("upload a .pdf, .jpg, .jpeg or .png document")
    )]
    UnsupportedFile(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(firstbutton::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(firstbutton::config))]
    Config(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(firstbutton::storage))]
    Storage(String),

    #[error(transparent)]
    #[diagnostic(code(firstbutton::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(firstbutton::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(firstbutton::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create malformed event errors
pub fn malformed_event_error(message: &str) -> Error {
    Error::MalformedEvent(message.to_string())
}

/// Helper to create calendar query errors
pub fn calendar_query_error(message: &str) -> Error {
    Error::CalendarQuery(message.to_string())
}

/// Helper to create insert errors
pub fn insert_error(message: &str) -> Error {
    Error::Insert(message.to_string())
}

/// Helper to create credentials errors
pub fn credentials_error(message: &str) -> Error {
    Error::Credentials(message.to_string())
}

/// Helper to create extraction errors
pub fn extraction_error(message: &str) -> Error {
    Error::Extraction(message.to_string())
}
