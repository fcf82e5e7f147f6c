#[derive(Debug, thiserror::Error)]
pub enum CsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Config parsing error: {0}")]
    Config(#[from] dotenvy::Error),
    #[error("Invalid value for {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Logging setup error: {0}")]
    Telemetry(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Unknown weather property: {0}")]
    InvalidProperty(String),
    #[error("Unknown grain: {0}")]
    InvalidGrain(String),
    #[error("Invalid reading payload: {0}")]
    InvalidPayload(String),
    #[error("Reading {0} already exists")]
    DuplicateReading(String),
    #[error("Error converting latest weather for city : {0} ; to JSON")]
    LatestToJson(serde_json::Error),
}

impl CsError {
    /// Errors caused by the request itself rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CsError::InvalidProperty(_)
                | CsError::InvalidGrain(_)
                | CsError::InvalidPayload(_)
                | CsError::DuplicateReading(_)
        )
    }
}
