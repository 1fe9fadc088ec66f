//! ASO workflows
//!
//! Each workflow takes a [`ServiceContext`] and an options struct, calls the
//! store clients sequentially and returns a serializable report. Partial
//! failures are collected in the report; an `Err` means nothing was done.

pub mod apps;
pub mod auth;
pub mod prepare;
pub mod pull;
pub mod push;
pub mod release_notes;
pub mod versions;

pub use apps::{add_app, search_apps, AddAppOptions};
pub use auth::{check_auth, check_store_auth, AuthCheckResult};
pub use prepare::{prepare, PrepareOptions, PrepareReport};
pub use pull::{pull, PullOptions, PullReport, StorePullResult};
pub use push::{
    push, AppStorePushResult, GooglePlayPushResult, LocaleFieldFailure, PushOptions, PushReport,
    PushSource,
};
pub use release_notes::{
    pull_release_notes, update_release_notes, update_whats_new, PullReleaseNotesReport,
    ReleaseNotesOutcome, ReleaseNotesReport, ReleaseNotesRequest, StoreReleaseNotesResult,
    TranslationRequest,
};
pub use versions::{
    check_versions, create_version, CreateVersionOptions, CreateVersionReport, VersionsReport,
};

use pabal_metadata::Store;
use pabal_stores::AppStoreApi;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, RegistryError, Result};
use crate::registry::RegisteredApp;

/// Which stores a tool call targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreSelection {
    AppStore,
    GooglePlay,
    #[default]
    Both,
}

impl StoreSelection {
    pub fn stores(&self) -> Vec<Store> {
        match self {
            StoreSelection::AppStore => vec![Store::AppStore],
            StoreSelection::GooglePlay => vec![Store::GooglePlay],
            StoreSelection::Both => Store::ALL.to_vec(),
        }
    }

    pub fn includes(&self, store: Store) -> bool {
        self.stores().contains(&store)
    }

    /// Selected stores the app is registered for
    ///
    /// An explicit single-store selection the app lacks is an error; `Both`
    /// quietly narrows to the registered stores.
    pub fn resolve_for(&self, app: &RegisteredApp) -> Result<Vec<Store>> {
        if let StoreSelection::AppStore | StoreSelection::GooglePlay = self {
            for store in self.stores() {
                if !app.has_store(store) {
                    return Err(RegistryError::StoreNotRegistered {
                        identifier: app.slug.clone(),
                        store,
                    }
                    .into());
                }
            }
        }

        let stores: Vec<Store> = self
            .stores()
            .into_iter()
            .filter(|store| app.has_store(*store))
            .collect();
        if stores.is_empty() {
            return Err(RegistryError::InvalidApp(format!(
                "'{}' is not registered for any store",
                app.slug
            ))
            .into());
        }
        Ok(stores)
    }
}

/// Store-level failure inside a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFailure {
    pub store: Store,
    pub kind: String,
    pub error: String,
}

impl StoreFailure {
    pub fn new(store: Store, error: &PabalError) -> Self {
        Self {
            store,
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }
}

/// App Store Connect app id for a registered app.
///
/// The id is looked up by bundle ID when the registry has none and cached
/// back into the registry.
pub(crate) async fn app_store_app_id(
    ctx: &ServiceContext,
    client: &dyn AppStoreApi,
    app: &RegisteredApp,
) -> Result<String> {
    let entry = app
        .app_store
        .as_ref()
        .ok_or_else(|| RegistryError::StoreNotRegistered {
            identifier: app.slug.clone(),
            store: Store::AppStore,
        })?;

    if let Some(id) = entry.app_id.as_deref().filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }

    debug!(bundle_id = %entry.bundle_id, "looking up App Store app id");
    let found = client.find_app(&entry.bundle_id).await?.ok_or_else(|| {
        PabalError::NotFound(format!(
            "No App Store Connect app with bundle ID {}",
            entry.bundle_id
        ))
    })?;

    let id = found.id.clone();
    if let Err(e) = ctx.registry().update_app(&app.slug, |registered| {
        if let Some(entry) = registered.app_store.as_mut() {
            entry.app_id = Some(found.id);
        }
        Ok(())
    }) {
        warn!(slug = %app.slug, error = %e, "could not cache App Store app id");
    }
    Ok(id)
}

/// Google Play package name for a registered app
pub(crate) fn google_play_package(app: &RegisteredApp) -> Result<&str> {
    app.google_play
        .as_ref()
        .map(|entry| entry.package_name.as_str())
        .ok_or_else(|| {
            RegistryError::StoreNotRegistered {
                identifier: app.slug.clone(),
                store: Store::GooglePlay,
            }
            .into()
        })
}

/// Merge locales into the registry cache, logging instead of failing
pub(crate) fn remember_locales(ctx: &ServiceContext, slug: &str, store: Store, locales: &[String]) {
    if locales.is_empty() {
        return;
    }
    if let Err(e) = ctx
        .registry()
        .update_supported_locales(slug, store, locales)
    {
        warn!(slug = %slug, store = %store, error = %e, "could not update supported locales");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AppStoreEntry, GooglePlayEntry};

    fn app(app_store: bool, google_play: bool) -> RegisteredApp {
        RegisteredApp {
            slug: "demo".to_string(),
            name: "Demo".to_string(),
            app_store: app_store.then(|| AppStoreEntry {
                bundle_id: "com.demo".to_string(),
                ..Default::default()
            }),
            google_play: google_play.then(|| GooglePlayEntry {
                package_name: "com.demo".to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_selection_json() {
        let selection: StoreSelection = serde_json::from_str("\"googlePlay\"").unwrap();
        assert_eq!(selection, StoreSelection::GooglePlay);
        let selection: StoreSelection = serde_json::from_str("\"both\"").unwrap();
        assert_eq!(selection.stores(), Store::ALL.to_vec());
    }

    #[test]
    fn test_both_narrows_to_registered_stores() {
        let stores = StoreSelection::Both.resolve_for(&app(false, true)).unwrap();
        assert_eq!(stores, vec![Store::GooglePlay]);
    }

    #[test]
    fn test_explicit_store_must_be_registered() {
        let err = StoreSelection::AppStore
            .resolve_for(&app(false, true))
            .unwrap_err();
        assert!(matches!(
            err,
            PabalError::Registry(RegistryError::StoreNotRegistered { .. })
        ));
    }
}
