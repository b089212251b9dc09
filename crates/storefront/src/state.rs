//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{Backend, BackendError};
use crate::config::{BackendMode, StorefrontConfig};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like backend clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Backend,
}

impl AppState {
    /// Create application state around an already built backend.
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: Backend) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, backend }),
        }
    }

    /// Build the backend selected by `config.backend` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::InvalidArgument` if Firebase mode is selected
    /// without Firebase settings.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, BackendError> {
        let backend = match config.backend {
            BackendMode::Memory => Backend::in_memory(),
            BackendMode::Firebase => {
                let firebase = config.firebase.as_ref().ok_or_else(|| {
                    BackendError::InvalidArgument("firebase settings missing".to_owned())
                })?;
                Backend::firebase(firebase)
            }
        };
        Ok(Self::new(config, backend))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document, file and auth backends.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }
}
