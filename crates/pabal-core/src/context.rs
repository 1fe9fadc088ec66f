//! Shared services for workflows

use std::sync::Arc;

use pabal_metadata::{AssetDownloader, AsoStorage, Store};
use pabal_stores::apple::AppStoreConnectClient;
use pabal_stores::google_play::GooglePlayClient;
use pabal_stores::{AppStoreApi, GooglePlayApi};
use tracing::{info, warn};

use crate::config::PabalConfig;
use crate::error::{ConfigError, Result};
use crate::registry::RegisteredAppsStore;

/// State of one store client
enum ClientSlot<T: ?Sized> {
    Ready(Arc<T>),
    Unconfigured,
    Failed(String),
}

impl<T: ?Sized> ClientSlot<T> {
    fn get(&self, store: Store) -> Result<Arc<T>> {
        match self {
            ClientSlot::Ready(client) => Ok(Arc::clone(client)),
            ClientSlot::Unconfigured => Err(ConfigError::StoreNotConfigured(store).into()),
            ClientSlot::Failed(message) => Err(ConfigError::ClientInit {
                store,
                message: message.clone(),
            }
            .into()),
        }
    }

    fn from_option(client: Option<Arc<T>>) -> Self {
        client.map_or(ClientSlot::Unconfigured, ClientSlot::Ready)
    }
}

/// Configuration, registry, cache and store clients shared by every tool call
pub struct ServiceContext {
    config: PabalConfig,
    registry: RegisteredAppsStore,
    storage: AsoStorage,
    assets: AssetDownloader,
    app_store: ClientSlot<dyn AppStoreApi>,
    google_play: ClientSlot<dyn GooglePlayApi>,
}

impl ServiceContext {
    /// Build real store clients from the configured credentials.
    ///
    /// A client that cannot be built is remembered as failed; tools that
    /// need it report the cause instead of the server refusing to start.
    pub fn from_config(config: PabalConfig) -> Self {
        let app_store = match &config.app_store {
            None => ClientSlot::Unconfigured,
            Some(credentials) => match AppStoreConnectClient::new(credentials.clone()) {
                Ok(client) => {
                    info!(key_id = %credentials.key_id, "App Store Connect client ready");
                    ClientSlot::Ready(Arc::new(client) as Arc<dyn AppStoreApi>)
                }
                Err(e) => {
                    warn!(error = %e, "App Store Connect client unavailable");
                    ClientSlot::Failed(e.to_string())
                }
            },
        };

        let google_play = match &config.google_play {
            None => ClientSlot::Unconfigured,
            Some(credentials) => match GooglePlayClient::new(credentials.clone()) {
                Ok(client) => {
                    info!(client_email = %client.client_email(), "Google Play client ready");
                    ClientSlot::Ready(Arc::new(client) as Arc<dyn GooglePlayApi>)
                }
                Err(e) => {
                    warn!(error = %e, "Google Play client unavailable");
                    ClientSlot::Failed(e.to_string())
                }
            },
        };

        Self::with_slots(config, app_store, google_play)
    }

    /// Context with caller-supplied clients
    pub fn new(
        config: PabalConfig,
        app_store: Option<Arc<dyn AppStoreApi>>,
        google_play: Option<Arc<dyn GooglePlayApi>>,
    ) -> Self {
        Self::with_slots(
            config,
            ClientSlot::from_option(app_store),
            ClientSlot::from_option(google_play),
        )
    }

    fn with_slots(
        config: PabalConfig,
        app_store: ClientSlot<dyn AppStoreApi>,
        google_play: ClientSlot<dyn GooglePlayApi>,
    ) -> Self {
        Self {
            registry: RegisteredAppsStore::new(&config.data_dir),
            storage: AsoStorage::new(config.data_dir.clone()),
            assets: AssetDownloader::new(),
            config,
            app_store,
            google_play,
        }
    }

    pub fn config(&self) -> &PabalConfig {
        &self.config
    }

    pub fn registry(&self) -> &RegisteredAppsStore {
        &self.registry
    }

    pub fn storage(&self) -> &AsoStorage {
        &self.storage
    }

    pub fn assets(&self) -> &AssetDownloader {
        &self.assets
    }

    /// App Store Connect client, or why there is none
    pub fn app_store(&self) -> Result<Arc<dyn AppStoreApi>> {
        self.app_store.get(Store::AppStore)
    }

    /// Google Play client, or why there is none
    pub fn google_play(&self) -> Result<Arc<dyn GooglePlayApi>> {
        self.google_play.get(Store::GooglePlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PabalError};
    use crate::testing::MockAppStore;
    use pabal_stores::AppStoreConfig;
    use tempfile::TempDir;

    #[test]
    fn test_unconfigured_store() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::from_config(PabalConfig::empty(temp.path()));

        let err = ctx.google_play().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(
            err,
            PabalError::Config(ConfigError::StoreNotConfigured(Store::GooglePlay))
        ));
    }

    #[test]
    fn test_client_init_failure_is_remembered() {
        let temp = TempDir::new().unwrap();
        let mut config = PabalConfig::empty(temp.path());
        config.app_store = Some(AppStoreConfig {
            issuer_id: "iss".to_string(),
            key_id: "KEY".to_string(),
            private_key_path: temp.path().join("missing.p8"),
        });

        let ctx = ServiceContext::from_config(config);
        let err = ctx.app_store().err().unwrap();
        assert!(matches!(
            err,
            PabalError::Config(ConfigError::ClientInit {
                store: Store::AppStore,
                ..
            })
        ));
    }

    #[test]
    fn test_injected_client() {
        let temp = TempDir::new().unwrap();
        let mock: Arc<dyn AppStoreApi> = Arc::new(MockAppStore::default());
        let ctx = ServiceContext::new(PabalConfig::empty(temp.path()), Some(mock), None);

        assert!(ctx.app_store().is_ok());
        assert!(ctx.google_play().is_err());
        assert_eq!(ctx.storage().data_dir(), temp.path());
    }
}
