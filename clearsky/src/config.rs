use std::path::PathBuf;

use crate::error::CsError;

const BIND_ADDRESS: &str = "CLEARSKY_BIND_ADDRESS";
const DATABASE_URL: &str = "CLEARSKY_DATABASE_URL";
const API_PREFIX: &str = "CLEARSKY_API_PREFIX";
const LOG_DIR: &str = "CLEARSKY_LOG_DIR";
const LOG_FILTER: &str = "RUST_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub api_prefix: String,
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Config {
    /// Reads settings from the process environment, after `.env` has been loaded.
    pub fn from_env() -> Result<Self, CsError> {
        Self::from_lookup(|name| match dotenvy::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CsError>
    where
        F: Fn(&str) -> Result<Option<String>, CsError>,
    {
        let var_or = |name: &str, default: &str| -> Result<String, CsError> {
            Ok(lookup(name)?
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string()))
        };

        let api_prefix = var_or(API_PREFIX, "/api")?;
        if !api_prefix.starts_with('/') {
            return Err(CsError::InvalidConfig {
                name: API_PREFIX,
                reason: format!("'{api_prefix}' must start with '/'"),
            });
        }

        Ok(Self {
            bind_address: var_or(BIND_ADDRESS, "0.0.0.0:8080")?,
            database_url: var_or(DATABASE_URL, "sqlite://clearsky.db?mode=rwc")?,
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
            log_dir: lookup(LOG_DIR)?
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            log_filter: var_or(LOG_FILTER, "info")?,
        })
    }
}
