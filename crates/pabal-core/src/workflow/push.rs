//! Push the local working copy to the stores
//!
//! Push data is read from `pushData`, falling back to `pullData`. Screenshot
//! references are stripped before anything is sent. When an App Store
//! version localization answers 409 STATE_ERROR the current version is
//! locked for edits: a new version is created by bumping the latest version
//! string and the caller is told to fill in what's new for it.

use std::collections::BTreeMap;

use pabal_metadata::{
    AppStoreLocaleData, AsoData, DataKind, GooglePlayLocaleData, LocalizedSet, MetadataError,
    Multilingual, Store,
};
use pabal_stores::{increment_version, AppStoreApi, LocaleFailure};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};
use crate::registry::RegisteredApp;

use super::{app_store_app_id, google_play_package, remember_locales, StoreFailure, StoreSelection};

const DEFAULT_PLATFORM: &str = "IOS";

/// Options for [`push`]
#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    pub app: String,
    pub stores: StoreSelection,
    /// Report what would be pushed without calling the stores
    pub dry_run: bool,
}

/// Side of the cache the pushed data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PushSource {
    PushData,
    PullData,
}

/// App Store field that failed for one locale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleFieldFailure {
    pub locale: String,
    pub field: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStorePushResult {
    pub pushed_locales: Vec<String>,
    pub failed_fields: Vec<LocaleFieldFailure>,
    pub failed_locales: Vec<LocaleFailure>,
    pub needs_new_version: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
    pub needs_whats_new_translation: bool,
    pub whats_new_locales: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayPushResult {
    pub updated: Vec<String>,
    pub failed: Vec<LocaleFailure>,
}

/// Outcome of [`push`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    pub slug: String,
    pub source: PushSource,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_page_url: Option<String>,
    /// Locales per store key that were (or would be) pushed
    pub planned: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_store: Option<AppStorePushResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_play: Option<GooglePlayPushResult>,
    pub failed: Vec<StoreFailure>,
}

impl PushReport {
    pub fn needs_new_version(&self) -> bool {
        self.app_store
            .as_ref()
            .is_some_and(|result| result.needs_new_version)
    }
}

pub async fn push(ctx: &ServiceContext, options: PushOptions) -> Result<PushReport> {
    let app = ctx.registry().resolve(&options.app)?;
    let stores = options.stores.resolve_for(&app)?;
    let (data, source) = load_push_data(ctx, &app.slug).await?;

    let mut data = data.strip_screenshots().retain_stores(&stores);
    if data.is_empty() {
        return Err(PabalError::NotFound(format!(
            "No local ASO data for '{}' in the selected stores",
            app.slug
        )));
    }

    let product_page_url = ctx.config().product_page_url(&app.slug);
    if let Some(url) = &product_page_url {
        rewrite_product_urls(&mut data, url);
    }

    let planned = Store::ALL
        .iter()
        .filter(|store| data.has_store(**store))
        .map(|store| (store.key().to_string(), data.locale_codes(*store)))
        .collect();

    let mut report = PushReport {
        slug: app.slug.clone(),
        source,
        dry_run: options.dry_run,
        product_page_url,
        planned,
        app_store: None,
        google_play: None,
        failed: Vec::new(),
    };

    if options.dry_run {
        info!(slug = %app.slug, "dry run, nothing pushed");
        return Ok(report);
    }

    if let Some(LocalizedSet::Multilingual(set)) = &data.app_store {
        match push_app_store(ctx, &app, set).await {
            Ok(result) => {
                remember_locales(ctx, &app.slug, Store::AppStore, &result.pushed_locales);
                report.app_store = Some(result);
            }
            Err(e) => {
                warn!(slug = %app.slug, error = %e, "App Store push failed");
                report.failed.push(StoreFailure::new(Store::AppStore, &e));
            }
        }
    }

    if let Some(LocalizedSet::Multilingual(set)) = &data.google_play {
        match push_google_play(ctx, &app, set).await {
            Ok(result) => {
                let pushed: Vec<String> = result
                    .updated
                    .iter()
                    .filter(|locale| locale.as_str() != "details")
                    .cloned()
                    .collect();
                remember_locales(ctx, &app.slug, Store::GooglePlay, &pushed);
                report.google_play = Some(result);
            }
            Err(e) => {
                warn!(slug = %app.slug, error = %e, "Google Play push failed");
                report.failed.push(StoreFailure::new(Store::GooglePlay, &e));
            }
        }
    }

    info!(
        slug = %app.slug,
        failed_stores = report.failed.len(),
        needs_new_version = report.needs_new_version(),
        "push finished"
    );
    Ok(report)
}

async fn load_push_data(ctx: &ServiceContext, slug: &str) -> Result<(AsoData, PushSource)> {
    match ctx.storage().load_aso_data(DataKind::Push, slug).await {
        Ok(data) => Ok((data, PushSource::PushData)),
        Err(MetadataError::NotFound(_)) => {
            debug!(slug = %slug, "no push data, falling back to pull data");
            let data = ctx
                .storage()
                .load_aso_data(DataKind::Pull, slug)
                .await
                .map_err(|e| match e {
                    MetadataError::NotFound(_) => PabalError::NotFound(format!(
                        "No local ASO data for '{}'; run aso-pull first",
                        slug
                    )),
                    other => other.into(),
                })?;
            Ok((data, PushSource::PullData))
        }
        Err(e) => Err(e.into()),
    }
}

fn rewrite_product_urls(data: &mut AsoData, url: &str) {
    if let Some(LocalizedSet::Multilingual(set)) = data.app_store.as_mut() {
        for entry in set.values_mut() {
            entry.marketing_url = Some(url.to_string());
        }
    }
    if let Some(LocalizedSet::Multilingual(set)) = data.google_play.as_mut() {
        for entry in set.values_mut() {
            entry.contact_website = Some(url.to_string());
        }
    }
}

async fn push_app_store(
    ctx: &ServiceContext,
    app: &RegisteredApp,
    set: &Multilingual<AppStoreLocaleData>,
) -> Result<AppStorePushResult> {
    let client = ctx.app_store()?;
    let app_id = app_store_app_id(ctx, client.as_ref(), app).await?;
    let mut result = AppStorePushResult::default();

    for (locale, entry) in set.iter() {
        let mut entry = entry.clone();
        entry.locale = Some(locale.clone());
        match client.push_metadata(&app_id, &entry).await {
            Ok(outcome) => {
                debug!(locale = %locale, "pushed App Store locale");
                result.pushed_locales.push(locale.clone());
                result
                    .failed_fields
                    .extend(outcome.failed_fields.into_iter().map(|f| LocaleFieldFailure {
                        locale: locale.clone(),
                        field: f.field,
                        error: f.error,
                    }));
            }
            Err(e) if e.is_state_conflict() => {
                warn!(locale = %locale, "version is not editable, creating a new one");
                result.needs_new_version = true;
                result.needs_whats_new_translation = true;
                result.whats_new_locales = set.locale_codes();
                match create_next_version(client.as_ref(), &app_id).await {
                    Ok(version) => result.new_version = Some(version),
                    Err(e) => result.failed_locales.push(LocaleFailure {
                        locale: locale.clone(),
                        error: format!("could not create a new version: {}", e),
                    }),
                }
                break;
            }
            Err(e) => {
                warn!(locale = %locale, error = %e, "App Store locale push failed");
                result.failed_locales.push(LocaleFailure {
                    locale: locale.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(result)
}

/// Create `increment_version(latest)`, or 1.0.0 when the app has no version
async fn create_next_version(client: &dyn AppStoreApi, app_id: &str) -> Result<String> {
    let latest = client.latest_version(app_id).await?;
    let (current, platform) = match &latest {
        Some(version) => (version.version_string.as_str(), version.platform.as_str()),
        None => ("", DEFAULT_PLATFORM),
    };

    let next = increment_version(current);
    let created = client.create_version(app_id, &next, platform).await?;
    info!(
        app_id = %app_id,
        previous = %current,
        version = %created.version_string,
        "created App Store version"
    );
    Ok(created.version_string)
}

async fn push_google_play(
    ctx: &ServiceContext,
    app: &RegisteredApp,
    set: &Multilingual<GooglePlayLocaleData>,
) -> Result<GooglePlayPushResult> {
    let client = ctx.google_play()?;
    let package_name = google_play_package(app)?;
    let report = client.push_metadata(package_name, set).await?;
    Ok(GooglePlayPushResult {
        updated: report.updated,
        failed: report.failed,
    })
}
