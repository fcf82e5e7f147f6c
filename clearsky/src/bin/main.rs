use clearsky::{
    config::Config,
    db::SqliteStore,
    error::CsError,
    telemetry,
};
use poem::{Server, listener::TcpListener};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), CsError> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _log_guard = telemetry::init(&config)?;

    let store = SqliteStore::connect(&config.database_url).await?;
    store.migrate().await?;
    info!(database = %config.database_url, "Database ready");

    info!(
        address = %config.bind_address,
        prefix = %config.api_prefix,
        "Starting readings service"
    );
    Server::new(TcpListener::bind(config.bind_address.clone()))
        .run(clearsky::routes(store, &config.api_prefix))
        .await?;

    Ok(())
}
