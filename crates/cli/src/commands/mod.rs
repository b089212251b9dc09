//! Command implementations.

pub mod inspect;
pub mod seed;

use thiserror::Error;

use marketplace_storefront::backend::Backend;
use marketplace_storefront::config::{BackendMode, ConfigError, FirebaseConfig};
use marketplace_storefront::db::RepositoryError;
use marketplace_storefront::services::{AddressError, WalletError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid fixture file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("address book error: {0}")]
    Address(#[from] AddressError),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
}

/// Connect to the backend selected by `MARKETPLACE_BACKEND`.
///
/// # Errors
///
/// Returns `CliError::Config` if the Firebase settings are missing or invalid.
pub fn connect() -> Result<Backend, CliError> {
    dotenvy::dotenv().ok();

    let mode = std::env::var("MARKETPLACE_BACKEND")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or(Ok(BackendMode::Firebase), |v| {
            v.parse::<BackendMode>()
                .map_err(|e| ConfigError::InvalidEnvVar("MARKETPLACE_BACKEND".to_owned(), e))
        })?;

    match mode {
        BackendMode::Firebase => {
            let config = FirebaseConfig::from_env()?;
            tracing::info!(project = %config.project_id, "Using Firebase backend");
            Ok(Backend::firebase(&config))
        }
        BackendMode::Memory => {
            tracing::warn!("Using the in-memory backend; nothing will be persisted");
            Ok(Backend::in_memory())
        }
    }
}
