//! Release notes and what's new
//!
//! Updating release notes is a multi-round exchange with the caller. Each call
//! carries every text gathered so far; when a locale the app supports has no
//! text, the call answers with a [`TranslationRequest`] instead of touching
//! the stores, and the caller comes back with the translations added.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use pabal_metadata::types::common::DEFAULT_LOCALE;
use pabal_metadata::utils::resolve_locale_text;
use pabal_metadata::{ReleaseNote, Store};
use pabal_stores::LocaleFailure;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};
use crate::registry::RegisteredApp;

use super::{app_store_app_id, google_play_package, remember_locales, StoreFailure, StoreSelection};

/// Track release notes go to when none is named
pub const DEFAULT_TRACK: &str = "production";

/// Input of [`update_release_notes`]
#[derive(Debug, Clone, Default)]
pub struct ReleaseNotesRequest {
    pub app: String,
    pub stores: StoreSelection,
    /// Free text in `source_locale`
    pub text: Option<String>,
    pub source_locale: Option<String>,
    /// Texts gathered so far, keyed by locale
    pub notes: BTreeMap<String, String>,
    /// App Store version to update; the latest when unset
    pub version_string: Option<String>,
    /// Google Play track; `production` when unset
    pub track: Option<String>,
    /// Google Play release to update; the newest on the track when unset
    pub version_code: Option<String>,
}

/// Locales the caller still has to translate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub source_locale: String,
    pub source_text: String,
    pub missing_locales: Vec<String>,
    pub required_locales: Vec<String>,
    pub stores: Vec<Store>,
}

/// Per-store result of a release notes update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReleaseNotesResult {
    pub store: Store,
    /// Version string or track that was updated
    pub target: String,
    pub updated: Vec<String>,
    pub failed: Vec<LocaleFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNotesReport {
    pub slug: String,
    pub results: Vec<StoreReleaseNotesResult>,
    pub failed: Vec<StoreFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ReleaseNotesOutcome {
    NeedsTranslation(TranslationRequest),
    Updated(ReleaseNotesReport),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullReleaseNotesReport {
    pub slug: String,
    pub notes: Vec<ReleaseNote>,
    pub path: PathBuf,
    pub failed: Vec<StoreFailure>,
}

/// Update release notes on the selected stores, or ask for translations
pub async fn update_release_notes(
    ctx: &ServiceContext,
    request: ReleaseNotesRequest,
) -> Result<ReleaseNotesOutcome> {
    let app = ctx.registry().resolve(&request.app)?;
    let stores = request.stores.resolve_for(&app)?;
    let (notes, source_locale) = collect_notes(&request)?;

    let mut required: Vec<(Store, Vec<String>)> = Vec::new();
    let mut failed = Vec::new();
    let mut first_error: Option<PabalError> = None;

    for store in stores {
        match required_locales(ctx, &app, store).await {
            Ok(locales) => required.push((store, locales)),
            Err(e) => {
                warn!(store = %store, error = %e, "could not determine supported locales");
                failed.push(StoreFailure::new(store, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if required.is_empty() {
        return Err(first_error.unwrap_or_else(|| {
            PabalError::NotFound(format!("No store to update for '{}'", app.slug))
        }));
    }

    let mut missing = BTreeSet::new();
    let mut all_required = BTreeSet::new();
    for (_, locales) in &required {
        for locale in locales {
            all_required.insert(locale.clone());
            if resolve_locale_text(&notes, locale).is_none() {
                missing.insert(locale.clone());
            }
        }
    }

    if !missing.is_empty() {
        let source_text = notes.get(&source_locale).cloned().unwrap_or_default();
        info!(
            slug = %app.slug,
            missing = missing.len(),
            "release notes need translation"
        );
        return Ok(ReleaseNotesOutcome::NeedsTranslation(TranslationRequest {
            source_locale,
            source_text,
            missing_locales: missing.into_iter().collect(),
            required_locales: all_required.into_iter().collect(),
            stores: required.iter().map(|(store, _)| *store).collect(),
        }));
    }

    let mut report = ReleaseNotesReport {
        slug: app.slug.clone(),
        results: Vec::new(),
        failed,
    };

    for (store, locales) in required {
        let per_store = texts_for_store(&notes, &locales);
        let applied = match store {
            Store::AppStore => apply_app_store(ctx, &app, &request, &per_store).await,
            Store::GooglePlay => apply_google_play(ctx, &app, &request, &per_store).await,
        };
        match applied {
            Ok(result) => {
                info!(
                    store = %store,
                    target = %result.target,
                    updated = result.updated.len(),
                    failed = result.failed.len(),
                    "release notes updated"
                );
                report.results.push(result);
            }
            Err(e) => {
                warn!(store = %store, error = %e, "release notes update failed");
                report.failed.push(StoreFailure::new(store, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if report.results.is_empty() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }
    Ok(ReleaseNotesOutcome::Updated(report))
}

/// What's new text for the App Store version
pub async fn update_whats_new(
    ctx: &ServiceContext,
    mut request: ReleaseNotesRequest,
) -> Result<ReleaseNotesOutcome> {
    request.stores = StoreSelection::AppStore;
    update_release_notes(ctx, request).await
}

/// Fetch the current release notes and save them to `release-notes.json`
pub async fn pull_release_notes(
    ctx: &ServiceContext,
    app: &str,
    stores: StoreSelection,
) -> Result<PullReleaseNotesReport> {
    let app = ctx.registry().resolve(app)?;
    let stores = stores.resolve_for(&app)?;

    let mut notes = Vec::new();
    let mut failed = Vec::new();
    let mut first_error: Option<PabalError> = None;

    for store in stores {
        let pulled = match store {
            Store::AppStore => pull_app_store_notes(ctx, &app).await,
            Store::GooglePlay => pull_google_play_notes(ctx, &app).await,
        };
        match pulled {
            Ok(note) => notes.push(note),
            Err(e) => {
                warn!(store = %store, error = %e, "could not pull release notes");
                failed.push(StoreFailure::new(store, &e));
                first_error.get_or_insert(e);
            }
        }
    }

    if notes.is_empty() {
        if let Some(e) = first_error {
            return Err(e);
        }
    }

    let path = ctx.storage().save_release_notes(&app.slug, &notes).await?;
    info!(slug = %app.slug, count = notes.len(), path = %path.display(), "saved release notes");
    Ok(PullReleaseNotesReport {
        slug: app.slug,
        notes,
        path,
        failed,
    })
}

/// Texts keyed by locale plus the locale the caller wrote in
fn collect_notes(request: &ReleaseNotesRequest) -> Result<(BTreeMap<String, String>, String)> {
    let mut notes: BTreeMap<String, String> = request
        .notes
        .iter()
        .map(|(locale, text)| (locale.trim().to_string(), text.trim().to_string()))
        .filter(|(locale, text)| !locale.is_empty() && !text.is_empty())
        .collect();

    let requested_source = request
        .source_locale
        .as_deref()
        .map(str::trim)
        .filter(|locale| !locale.is_empty());

    if let Some(text) = request.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let source = requested_source.unwrap_or(DEFAULT_LOCALE);
        notes
            .entry(source.to_string())
            .or_insert_with(|| text.to_string());
    }

    if notes.is_empty() {
        return Err(PabalError::Validation(
            "Provide release notes text or a locale-to-text map".to_string(),
        ));
    }

    let source_locale = requested_source
        .filter(|locale| notes.contains_key(*locale))
        .or_else(|| notes.contains_key(DEFAULT_LOCALE).then_some(DEFAULT_LOCALE))
        .or_else(|| notes.keys().next().map(String::as_str))
        .unwrap_or(DEFAULT_LOCALE)
        .to_string();

    Ok((notes, source_locale))
}

/// Cached supported locales, fetched live and cached when missing
async fn required_locales(
    ctx: &ServiceContext,
    app: &RegisteredApp,
    store: Store,
) -> Result<Vec<String>> {
    if let Some(cached) = app.supported_locales(store).filter(|l| !l.is_empty()) {
        debug!(store = %store, count = cached.len(), "using cached supported locales");
        return Ok(cached.to_vec());
    }

    let locales = match store {
        Store::AppStore => {
            let client = ctx.app_store()?;
            let app_id = app_store_app_id(ctx, client.as_ref(), app).await?;
            client.supported_locales(&app_id).await?
        }
        Store::GooglePlay => {
            let client = ctx.google_play()?;
            client.supported_locales(google_play_package(app)?).await?
        }
    };
    remember_locales(ctx, &app.slug, store, &locales);
    Ok(locales)
}

/// Text per store locale; every supplied text when the store reports none
fn texts_for_store(notes: &BTreeMap<String, String>, locales: &[String]) -> BTreeMap<String, String> {
    if locales.is_empty() {
        return notes.clone();
    }
    locales
        .iter()
        .filter_map(|locale| {
            resolve_locale_text(notes, locale).map(|text| (locale.clone(), text.to_string()))
        })
        .collect()
}

async fn apply_app_store(
    ctx: &ServiceContext,
    app: &RegisteredApp,
    request: &ReleaseNotesRequest,
    notes: &BTreeMap<String, String>,
) -> Result<StoreReleaseNotesResult> {
    let client = ctx.app_store()?;
    let app_id = app_store_app_id(ctx, client.as_ref(), app).await?;

    let version_id = match request.version_string.as_deref() {
        Some(version_string) => {
            let version = client
                .list_versions(&app_id)
                .await?
                .into_iter()
                .find(|v| v.version_string == version_string)
                .ok_or_else(|| {
                    PabalError::NotFound(format!(
                        "App Store version {} not found for '{}'",
                        version_string, app.slug
                    ))
                })?;
            Some(version.id)
        }
        None => None,
    };

    let report = client
        .update_release_notes(&app_id, version_id.as_deref(), notes)
        .await?;
    Ok(StoreReleaseNotesResult {
        store: Store::AppStore,
        target: request
            .version_string
            .clone()
            .unwrap_or_else(|| "latest version".to_string()),
        updated: report.updated,
        failed: report.failed,
    })
}

async fn apply_google_play(
    ctx: &ServiceContext,
    app: &RegisteredApp,
    request: &ReleaseNotesRequest,
    notes: &BTreeMap<String, String>,
) -> Result<StoreReleaseNotesResult> {
    let client = ctx.google_play()?;
    let package_name = google_play_package(app)?;
    let track = request.track.as_deref().unwrap_or(DEFAULT_TRACK);

    let report = client
        .update_release_notes(package_name, track, request.version_code.as_deref(), notes)
        .await?;
    Ok(StoreReleaseNotesResult {
        store: Store::GooglePlay,
        target: match &request.version_code {
            Some(code) => format!("{} (versionCode {})", track, code),
            None => track.to_string(),
        },
        updated: report.updated,
        failed: report.failed,
    })
}

async fn pull_app_store_notes(ctx: &ServiceContext, app: &RegisteredApp) -> Result<ReleaseNote> {
    let client = ctx.app_store()?;
    let app_id = app_store_app_id(ctx, client.as_ref(), app).await?;
    let latest = client.latest_version(&app_id).await?.ok_or_else(|| {
        PabalError::NotFound(format!("'{}' has no App Store version", app.slug))
    })?;

    let locales = client.pull_all_locales(&app_id).await?;
    let release_notes = locales
        .iter()
        .filter_map(|(locale, data)| {
            data.whats_new
                .as_ref()
                .map(|text| (locale.clone(), text.clone()))
        })
        .collect();

    Ok(ReleaseNote {
        platform: Store::AppStore,
        version_string: Some(latest.version_string),
        version_code: None,
        release_notes,
    })
}

async fn pull_google_play_notes(ctx: &ServiceContext, app: &RegisteredApp) -> Result<ReleaseNote> {
    let client = ctx.google_play()?;
    let package_name = google_play_package(app)?;
    let release = client
        .latest_release(package_name, DEFAULT_TRACK)
        .await?
        .ok_or_else(|| {
            PabalError::NotFound(format!(
                "'{}' has no release on the {} track",
                app.slug, DEFAULT_TRACK
            ))
        })?;

    Ok(ReleaseNote {
        platform: Store::GooglePlay,
        version_string: release.release_name.clone(),
        version_code: Some(release.max_version_code()),
        release_notes: release.release_notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PabalConfig;
    use crate::error::ErrorKind;
    use crate::registry::{AppStoreEntry, GooglePlayEntry};
    use crate::testing::{MockAppStore, MockGooglePlay};
    use pabal_metadata::{AppStoreLocaleData, Multilingual};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn register(ctx: &ServiceContext, app_store_locales: &[&str], google_play_locales: &[&str]) {
        let locales =
            |l: &[&str]| -> Option<Vec<String>> { Some(l.iter().map(|s| s.to_string()).collect()) };
        ctx.registry()
            .register(RegisteredApp {
                slug: "notes".to_string(),
                name: "Notes".to_string(),
                app_store: Some(AppStoreEntry {
                    bundle_id: "com.example.notes".to_string(),
                    app_id: Some("123".to_string()),
                    name: None,
                    supported_locales: locales(app_store_locales),
                }),
                google_play: Some(GooglePlayEntry {
                    package_name: "com.example.notes".to_string(),
                    name: None,
                    supported_locales: locales(google_play_locales),
                }),
            })
            .unwrap();
    }

    fn request(notes: &[(&str, &str)]) -> ReleaseNotesRequest {
        ReleaseNotesRequest {
            app: "notes".to_string(),
            notes: notes
                .iter()
                .map(|(l, t)| (l.to_string(), t.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_notes_from_text() {
        let request = ReleaseNotesRequest {
            text: Some("Bug fixes".to_string()),
            source_locale: Some("ko-KR".to_string()),
            ..Default::default()
        };
        let (notes, source) = collect_notes(&request).unwrap();
        assert_eq!(source, "ko-KR");
        assert_eq!(notes["ko-KR"], "Bug fixes");

        let err = collect_notes(&ReleaseNotesRequest::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_missing_locales_request_translation() {
        let temp = TempDir::new().unwrap();
        let app_store = Arc::new(MockAppStore::default());
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(app_store.clone()),
            Some(Arc::new(MockGooglePlay::default())),
        );
        register(&ctx, &["en-US", "ja"], &["en-US", "ko-KR"]);

        let outcome = update_release_notes(
            &ctx,
            ReleaseNotesRequest {
                app: "notes".to_string(),
                text: Some("Bug fixes".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let ReleaseNotesOutcome::NeedsTranslation(translation) = outcome else {
            panic!("expected a translation request");
        };
        assert_eq!(translation.source_locale, "en-US");
        assert_eq!(translation.source_text, "Bug fixes");
        assert_eq!(translation.missing_locales, vec!["ja", "ko-KR"]);
        assert_eq!(translation.required_locales, vec!["en-US", "ja", "ko-KR"]);
        assert_eq!(translation.stores, vec![Store::AppStore, Store::GooglePlay]);
        assert!(app_store.release_note_updates().is_empty());
    }

    #[tokio::test]
    async fn test_other_script_counts_as_missing() {
        let temp = TempDir::new().unwrap();
        let app_store = Arc::new(MockAppStore::default());
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(app_store.clone()),
            None,
        );
        register(&ctx, &["en-US", "zh-Hans", "zh-Hant"], &[]);

        let mut req = request(&[("en-US", "Fixes"), ("zh-Hans", "修复")]);
        req.stores = StoreSelection::AppStore;
        let outcome = update_release_notes(&ctx, req).await.unwrap();

        let ReleaseNotesOutcome::NeedsTranslation(translation) = outcome else {
            panic!("expected a translation request");
        };
        assert_eq!(translation.missing_locales, vec!["zh-Hant"]);
        assert!(app_store.release_note_updates().is_empty());
    }

    #[tokio::test]
    async fn test_complete_map_updates_each_store() {
        let temp = TempDir::new().unwrap();
        let app_store = Arc::new(MockAppStore::default());
        let google_play = Arc::new(MockGooglePlay::default());
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(app_store.clone()),
            Some(google_play.clone()),
        );
        register(&ctx, &["en-US", "ko"], &["en-US", "ko-KR"]);

        let outcome = update_release_notes(&ctx, request(&[("en-US", "Fixes"), ("ko", "수정")]))
            .await
            .unwrap();

        let ReleaseNotesOutcome::Updated(report) = outcome else {
            panic!("expected an update");
        };
        assert_eq!(report.results.len(), 2);
        assert!(report.failed.is_empty());

        let (version_id, notes) = &app_store.release_note_updates()[0];
        assert!(version_id.is_none());
        assert_eq!(notes["ko"], "수정");

        let (track, notes) = &google_play.release_note_updates()[0];
        assert_eq!(track, "production");
        assert_eq!(notes["ko-KR"], "수정");
        assert!(!notes.contains_key("ko"));
    }

    #[tokio::test]
    async fn test_locales_fetched_live_and_cached() {
        let temp = TempDir::new().unwrap();
        let mut en = AppStoreLocaleData::new("en-US");
        en.name = Some("Notes".to_string());
        let mut set = Multilingual::single("en-US", en);
        set.insert("fr-FR", AppStoreLocaleData::new("fr-FR"));

        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(MockAppStore::default().with_locales(set))),
            None,
        );
        register(&ctx, &[], &[]);

        let outcome = update_whats_new(&ctx, request(&[("en-US", "Fixes")]))
            .await
            .unwrap();
        let ReleaseNotesOutcome::NeedsTranslation(translation) = outcome else {
            panic!("expected a translation request");
        };
        assert_eq!(translation.missing_locales, vec!["fr-FR"]);
        assert_eq!(translation.stores, vec![Store::AppStore]);

        let app = ctx.registry().resolve("notes").unwrap();
        assert_eq!(
            app.supported_locales(Store::AppStore).unwrap(),
            ["en-US", "fr-FR"]
        );
    }

    #[tokio::test]
    async fn test_unknown_version_string() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(
                MockAppStore::default().with_version("v1", "1.0.0", "READY_FOR_SALE"),
            )),
            None,
        );
        register(&ctx, &["en-US"], &[]);

        let mut req = request(&[("en-US", "Fixes")]);
        req.stores = StoreSelection::AppStore;
        req.version_string = Some("9.9.9".to_string());

        let err = update_release_notes(&ctx, req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_pull_release_notes_saves_file() {
        let temp = TempDir::new().unwrap();
        let mut en = AppStoreLocaleData::new("en-US");
        en.whats_new = Some("New editor".to_string());

        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(
                MockAppStore::default()
                    .with_locales(Multilingual::single("en-US", en))
                    .with_version("v3", "3.1.0", "READY_FOR_SALE"),
            )),
            Some(Arc::new(
                MockGooglePlay::default().with_release("production", "310", "3.1.0"),
            )),
        );
        register(&ctx, &["en-US"], &["en-US"]);

        let report = pull_release_notes(&ctx, "notes", StoreSelection::Both)
            .await
            .unwrap();
        assert_eq!(report.notes.len(), 2);
        assert_eq!(report.notes[0].version_string.as_deref(), Some("3.1.0"));
        assert_eq!(report.notes[0].release_notes["en-US"], "New editor");
        assert_eq!(report.notes[1].version_code, Some(310));

        let saved = ctx.storage().load_release_notes("notes").await.unwrap();
        assert_eq!(saved, report.notes);
    }
}
