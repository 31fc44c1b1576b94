//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ShowroomConfig;
use crate::identity::IdentityClient;
use crate::services::TokenProvider;
use crate::showroom::ShowroomClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShowroomConfig,
    showroom: ShowroomClient,
    identity: IdentityClient,
    auth: TokenProvider,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ShowroomConfig) -> Self {
        let showroom = ShowroomClient::new(&config);
        let identity = IdentityClient::new(&config.identity);
        let auth = TokenProvider::new(identity.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                showroom,
                identity,
                auth,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &ShowroomConfig {
        &self.inner.config
    }

    /// Get a reference to the showroom API client.
    #[must_use]
    pub fn showroom(&self) -> &ShowroomClient {
        &self.inner.showroom
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the token provider.
    #[must_use]
    pub fn auth(&self) -> &TokenProvider {
        &self.inner.auth
    }
}
