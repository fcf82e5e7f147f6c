use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::{config::Config, error::CsError};

const SERVICE_NAME: &str = "clearsky";

/// Installs the global subscriber: bunyan JSON to stdout, and to a daily
/// rolling file when a log directory is configured.
///
/// Keep the returned guard alive for as long as file logging should flush.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>, CsError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{SERVICE_NAME}.log"));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(BunyanFormattingLayer::new(SERVICE_NAME.to_string(), writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(
            SERVICE_NAME.to_string(),
            std::io::stdout,
        ))
        .with(file_layer);
    set_global_default(subscriber)?;

    Ok(guard)
}
