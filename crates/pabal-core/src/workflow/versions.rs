//! Version checks and creation

use std::cmp::Ordering;
use std::collections::BTreeMap;

use pabal_metadata::Store;
use pabal_stores::{
    compare_versions, increment_version, AppStoreVersion, GooglePlayRelease, GOOGLE_PLAY_TRACKS,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};

use super::{app_store_app_id, google_play_package, StoreFailure, StoreSelection};

const DEFAULT_PLATFORM: &str = "IOS";

/// Outcome of [`check_versions`]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionsReport {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_store: Option<AppStoreVersion>,
    /// Newest release per Google Play track; tracks without releases are left out
    pub google_play: BTreeMap<String, GooglePlayRelease>,
    pub failed: Vec<StoreFailure>,
}

/// Latest App Store version and newest release of every Google Play track
pub async fn check_versions(
    ctx: &ServiceContext,
    app: &str,
    stores: StoreSelection,
) -> Result<VersionsReport> {
    let app = ctx.registry().resolve(app)?;
    let stores = stores.resolve_for(&app)?;
    let mut report = VersionsReport {
        slug: app.slug.clone(),
        ..Default::default()
    };

    if stores.contains(&Store::AppStore) {
        let latest = async {
            let client = ctx.app_store()?;
            let app_id = app_store_app_id(ctx, client.as_ref(), &app).await?;
            Ok::<_, PabalError>(client.latest_version(&app_id).await?)
        }
        .await;

        match latest {
            Ok(version) => report.app_store = version,
            Err(e) => {
                warn!(slug = %app.slug, error = %e, "could not read App Store versions");
                report.failed.push(StoreFailure::new(Store::AppStore, &e));
            }
        }
    }

    if stores.contains(&Store::GooglePlay) {
        let releases = async {
            let client = ctx.google_play()?;
            let package_name = google_play_package(&app)?;
            let mut releases = BTreeMap::new();
            for track in GOOGLE_PLAY_TRACKS {
                if let Some(release) = client.latest_release(package_name, track).await? {
                    releases.insert(track.to_string(), release);
                }
            }
            Ok::<_, PabalError>(releases)
        }
        .await;

        match releases {
            Ok(releases) => report.google_play = releases,
            Err(e) => {
                warn!(slug = %app.slug, error = %e, "could not read Google Play tracks");
                report.failed.push(StoreFailure::new(Store::GooglePlay, &e));
            }
        }
    }

    Ok(report)
}

/// Options for [`create_version`]
#[derive(Debug, Clone, Default)]
pub struct CreateVersionOptions {
    pub app: String,
    pub stores: StoreSelection,
    /// App Store version string; the latest version bumped when unset
    pub version_string: Option<String>,
    /// Already uploaded Google Play version codes for a draft release
    pub version_codes: Vec<String>,
    /// Google Play track; `production` when unset
    pub track: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionReport {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_store: Option<AppStoreVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_play: Option<GooglePlayRelease>,
    pub failed: Vec<StoreFailure>,
}

/// Create an App Store version and, when version codes are given, a draft
/// Google Play release
pub async fn create_version(
    ctx: &ServiceContext,
    options: CreateVersionOptions,
) -> Result<CreateVersionReport> {
    let app = ctx.registry().resolve(&options.app)?;
    let mut stores = options.stores.resolve_for(&app)?;
    if options.version_codes.is_empty() {
        if options.stores == StoreSelection::GooglePlay {
            return Err(PabalError::Validation(
                "versionCodes are required to create a Google Play release".to_string(),
            ));
        }
        stores.retain(|store| *store != Store::GooglePlay);
    }
    if stores.is_empty() {
        return Err(PabalError::Validation(format!(
            "Nothing to create for '{}'",
            app.slug
        )));
    }

    let mut report = CreateVersionReport {
        slug: app.slug.clone(),
        ..Default::default()
    };
    let mut first_error: Option<PabalError> = None;

    if stores.contains(&Store::AppStore) {
        let created = async {
            let client = ctx.app_store()?;
            let app_id = app_store_app_id(ctx, client.as_ref(), &app).await?;
            let latest = client.latest_version(&app_id).await?;
            let previous = latest.as_ref().map(|v| v.version_string.as_str()).unwrap_or("");
            let platform = latest
                .as_ref()
                .map(|v| v.platform.as_str())
                .unwrap_or(DEFAULT_PLATFORM);

            let version_string = match options.version_string.as_deref().map(str::trim) {
                Some(requested) if !requested.is_empty() => {
                    if !previous.is_empty()
                        && compare_versions(requested, previous) != Ordering::Greater
                    {
                        return Err(PabalError::Validation(format!(
                            "Version {} must be greater than the latest version {}",
                            requested, previous
                        )));
                    }
                    requested.to_string()
                }
                _ => increment_version(previous),
            };

            let version = client
                .create_version(&app_id, &version_string, platform)
                .await?;
            info!(slug = %app.slug, version = %version.version_string, "created App Store version");
            Ok::<_, PabalError>(version)
        }
        .await;

        match created {
            Ok(version) => report.app_store = Some(version),
            Err(e) => {
                report.failed.push(StoreFailure::new(Store::AppStore, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if stores.contains(&Store::GooglePlay) {
        let track = options.track.as_deref().unwrap_or(super::release_notes::DEFAULT_TRACK);
        let created = async {
            let client = ctx.google_play()?;
            let package_name = google_play_package(&app)?;
            let release = client
                .create_release(
                    package_name,
                    track,
                    &options.version_codes,
                    options.version_string.as_deref(),
                )
                .await?;
            info!(slug = %app.slug, track = %track, "created Google Play draft release");
            Ok::<_, PabalError>(release)
        }
        .await;

        match created {
            Ok(release) => report.google_play = Some(release),
            Err(e) => {
                report.failed.push(StoreFailure::new(Store::GooglePlay, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if report.app_store.is_none() && report.google_play.is_none() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PabalConfig;
    use crate::error::ErrorKind;
    use crate::registry::{AppStoreEntry, GooglePlayEntry, RegisteredApp};
    use crate::testing::{MockAppStore, MockGooglePlay};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(temp: &TempDir, app_store: MockAppStore, google_play: MockGooglePlay) -> ServiceContext {
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(app_store)),
            Some(Arc::new(google_play)),
        );
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
        ctx
    }

    #[tokio::test]
    async fn test_check_versions() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            &temp,
            MockAppStore::default()
                .with_version("a", "1.9.9", "READY_FOR_SALE")
                .with_version("b", "2.0.0", "PREPARE_FOR_SUBMISSION"),
            MockGooglePlay::default()
                .with_release("production", "41", "1.9.9")
                .with_release("production", "42", "2.0.0")
                .with_release("beta", "43", "2.0.1"),
        );

        let report = check_versions(&ctx, "notes", StoreSelection::Both)
            .await
            .unwrap();
        let latest = report.app_store.unwrap();
        assert_eq!(latest.version_string, "2.0.0");
        assert_eq!(latest.app_store_state, "PREPARE_FOR_SUBMISSION");

        assert_eq!(report.google_play.len(), 2);
        assert_eq!(report.google_play["production"].version_codes, vec!["42"]);
        assert_eq!(report.google_play["beta"].version_codes, vec!["43"]);
        assert!(!report.google_play.contains_key("alpha"));
    }

    #[tokio::test]
    async fn test_create_version_increments_latest() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            &temp,
            MockAppStore::default().with_version("a", "1.4.2", "READY_FOR_SALE"),
            MockGooglePlay::default(),
        );

        let report = create_version(
            &ctx,
            CreateVersionOptions {
                app: "notes".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(report.app_store.unwrap().version_string, "1.4.3");
        // no version codes, so no Google Play release
        assert!(report.google_play.is_none());
    }

    #[tokio::test]
    async fn test_create_version_rejects_older_version() {
        let temp = TempDir::new().unwrap();
        let ctx = context(
            &temp,
            MockAppStore::default().with_version("a", "2.0.0", "READY_FOR_SALE"),
            MockGooglePlay::default(),
        );

        let err = create_version(
            &ctx,
            CreateVersionOptions {
                app: "notes".to_string(),
                stores: StoreSelection::AppStore,
                version_string: Some("1.9".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_create_google_play_release() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, MockAppStore::default(), MockGooglePlay::default());

        let report = create_version(
            &ctx,
            CreateVersionOptions {
                app: "notes".to_string(),
                stores: StoreSelection::GooglePlay,
                version_string: Some("2.1.0".to_string()),
                version_codes: vec!["210".to_string()],
                track: Some("beta".to_string()),
            },
        )
        .await
        .unwrap();

        let release = report.google_play.unwrap();
        assert_eq!(release.track, "beta");
        assert_eq!(release.status, "draft");
        assert_eq!(release.release_name.as_deref(), Some("2.1.0"));
        assert!(report.app_store.is_none());
    }

    #[tokio::test]
    async fn test_google_play_release_needs_version_codes() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp, MockAppStore::default(), MockGooglePlay::default());

        let err = create_version(
            &ctx,
            CreateVersionOptions {
                app: "notes".to_string(),
                stores: StoreSelection::GooglePlay,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
