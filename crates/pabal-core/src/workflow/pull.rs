//! Pull listings from the stores into the local cache

use std::path::PathBuf;

use pabal_metadata::{
    AppStoreLocaleData, AsoData, DataKind, GooglePlayLocaleData, LocalizedSet, Multilingual, Store,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};
use crate::registry::RegisteredApp;

use super::{app_store_app_id, google_play_package, remember_locales, StoreFailure, StoreSelection};

/// Options for [`pull`]
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    /// Slug, bundle ID or package name
    pub app: String,
    pub stores: StoreSelection,
    pub download_screenshots: bool,
}

/// What was pulled from one store
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePullResult {
    pub store: Store,
    pub locales: Vec<String>,
    pub default_locale: String,
}

/// Outcome of [`pull`]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReport {
    pub slug: String,
    pub pulled: Vec<StorePullResult>,
    pub failed: Vec<StoreFailure>,
    pub saved: Vec<PathBuf>,
    pub screenshots_downloaded: usize,
    pub screenshot_failures: Vec<String>,
}

/// Pull every locale of the selected stores and save them as pull data.
///
/// A failing store is reported and the other store is still pulled. When no
/// store could be pulled the first failure is returned.
pub async fn pull(ctx: &ServiceContext, options: PullOptions) -> Result<PullReport> {
    let app = ctx.registry().resolve(&options.app)?;
    let stores = options.stores.resolve_for(&app)?;
    info!(slug = %app.slug, stores = ?stores, "pulling ASO data");

    let mut report = PullReport {
        slug: app.slug.clone(),
        ..Default::default()
    };
    let mut data = AsoData::default();
    let mut first_error: Option<PabalError> = None;

    for store in stores {
        let pulled = match store {
            Store::AppStore => pull_app_store(ctx, &app).await.map(|set| {
                let result = StorePullResult {
                    store,
                    locales: set.locale_codes(),
                    default_locale: set.default_locale().to_string(),
                };
                data.app_store = Some(LocalizedSet::Multilingual(set));
                result
            }),
            Store::GooglePlay => pull_google_play(ctx, &app).await.map(|set| {
                let result = StorePullResult {
                    store,
                    locales: set.locale_codes(),
                    default_locale: set.default_locale().to_string(),
                };
                data.google_play = Some(LocalizedSet::Multilingual(set));
                result
            }),
        };

        match pulled {
            Ok(result) => {
                info!(store = %store, locales = result.locales.len(), "pulled store listing");
                remember_locales(ctx, &app.slug, store, &result.locales);
                report.pulled.push(result);
            }
            Err(e) => {
                warn!(store = %store, error = %e, "pull failed");
                report.failed.push(StoreFailure::new(store, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if data.is_empty() {
        return Err(first_error
            .unwrap_or_else(|| PabalError::NotFound(format!("Nothing to pull for '{}'", app.slug))));
    }

    report.saved = ctx
        .storage()
        .save_aso_data(DataKind::Pull, &app.slug, &data)
        .await?;

    if options.download_screenshots {
        match ctx
            .assets()
            .download_screenshots(ctx.storage(), DataKind::Pull, &app.slug, &data)
            .await
        {
            Ok(summary) => {
                report.screenshots_downloaded = summary.downloaded.len();
                report.screenshot_failures = summary
                    .failed
                    .into_iter()
                    .map(|(source, error)| format!("{}: {}", source, error))
                    .collect();
            }
            Err(e) => {
                warn!(slug = %app.slug, error = %e, "screenshot download failed");
                report.screenshot_failures.push(e.to_string());
            }
        }
    }

    Ok(report)
}

async fn pull_app_store(
    ctx: &ServiceContext,
    app: &RegisteredApp,
) -> Result<Multilingual<AppStoreLocaleData>> {
    let client = ctx.app_store()?;
    let app_id = app_store_app_id(ctx, client.as_ref(), app).await?;
    Ok(client.pull_all_locales(&app_id).await?)
}

async fn pull_google_play(
    ctx: &ServiceContext,
    app: &RegisteredApp,
) -> Result<Multilingual<GooglePlayLocaleData>> {
    let client = ctx.google_play()?;
    let package_name = google_play_package(app)?;
    Ok(client.pull_all_locales(package_name).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PabalConfig;
    use crate::error::ErrorKind;
    use crate::registry::{AppStoreEntry, GooglePlayEntry};
    use crate::testing::{MockAppStore, MockGooglePlay};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn register(ctx: &ServiceContext) {
        ctx.registry()
            .register(RegisteredApp {
                slug: "notes".to_string(),
                name: "Notes".to_string(),
                app_store: Some(AppStoreEntry {
                    bundle_id: "com.example.notes".to_string(),
                    app_id: Some("123".to_string()),
                    ..Default::default()
                }),
                google_play: Some(GooglePlayEntry {
                    package_name: "com.example.notes".to_string(),
                    ..Default::default()
                }),
            })
            .unwrap();
    }

    fn app_store_locales() -> Multilingual<AppStoreLocaleData> {
        let mut en = AppStoreLocaleData::new("en-US");
        en.name = Some("Notes".to_string());
        let mut ko = AppStoreLocaleData::new("ko");
        ko.name = Some("노트".to_string());

        let mut set = Multilingual::single("en-US", en);
        set.insert("ko", ko);
        set
    }

    #[tokio::test]
    async fn test_pull_saves_and_caches_locales() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(
                MockAppStore::default().with_locales(app_store_locales()),
            )),
            Some(Arc::new(MockGooglePlay::default())),
        );
        register(&ctx);

        let report = pull(
            &ctx,
            PullOptions {
                app: "notes".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(report.pulled.len(), 1);
        assert_eq!(report.pulled[0].locales, vec!["en-US", "ko"]);
        // Google Play mock has no listing for the package
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].store, Store::GooglePlay);
        assert_eq!(report.failed[0].kind, "NotFound");

        let saved = ctx
            .storage()
            .load_aso_data(DataKind::Pull, "notes")
            .await
            .unwrap();
        assert_eq!(saved.locale_codes(Store::AppStore), vec!["en-US", "ko"]);
        assert!(!saved.has_store(Store::GooglePlay));

        let app = ctx.registry().resolve("notes").unwrap();
        assert_eq!(
            app.supported_locales(Store::AppStore).unwrap(),
            ["en-US", "ko"]
        );
    }

    #[tokio::test]
    async fn test_pull_fails_when_no_store_succeeds() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            None,
            Some(Arc::new(MockGooglePlay::default())),
        );
        register(&ctx);

        let err = pull(
            &ctx,
            PullOptions {
                app: "com.example.notes".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!ctx.storage().exists(DataKind::Pull, "notes"));
    }

    #[tokio::test]
    async fn test_pull_downloads_local_screenshots() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("phone.png");
        std::fs::write(&source, b"png").unwrap();

        let mut listing = GooglePlayLocaleData::new("en-US");
        listing.title = Some("Notes".to_string());
        listing.screenshots.phone = vec![source.display().to_string()];

        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            None,
            Some(Arc::new(
                MockGooglePlay::default().with_locales(Multilingual::single("en-US", listing)),
            )),
        );
        register(&ctx);

        let report = pull(
            &ctx,
            PullOptions {
                app: "notes".to_string(),
                stores: StoreSelection::GooglePlay,
                download_screenshots: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.screenshots_downloaded, 1);
        let target = ctx
            .storage()
            .screenshots_dir(DataKind::Pull, "notes", Store::GooglePlay)
            .unwrap()
            .join("en-US")
            .join("phone-1.png");
        assert!(target.exists());
    }
}
