//! Screenshot download into the local cache.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::storage::{validate_locale_dir, AsoStorage, DataKind};
use crate::types::aso::AsoData;
use crate::types::common::{LocaleEntry, Multilingual, Store};
use crate::utils::{is_local_asset_path, resolve_app_store_image_url};
use crate::{MetadataError, Result};

/// Outcome of a screenshot download run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSummary {
    /// Files written.
    pub downloaded: Vec<PathBuf>,
    /// `(source, error)` for every asset that could not be fetched.
    pub failed: Vec<(String, String)>,
}

impl DownloadSummary {
    fn merge(&mut self, other: DownloadSummary) {
        self.downloaded.extend(other.downloaded);
        self.failed.extend(other.failed);
    }
}

/// Copies or downloads screenshot sources into the cache.
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    client: reqwest::Client,
}

impl Default for AssetDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetDownloader {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Downloads every screenshot referenced by `data` into
    /// `.../store/<store>/screenshots/<locale>/<type>-<n>.png`.
    ///
    /// Locales and types without screenshots are skipped. A failing asset is
    /// recorded and does not stop the run. Every asset of a locale whose key
    /// is not a plain directory name is recorded as failed.
    pub async fn download_screenshots(
        &self,
        storage: &AsoStorage,
        kind: DataKind,
        slug: &str,
        data: &AsoData,
    ) -> Result<DownloadSummary> {
        let mut summary = DownloadSummary::default();

        if let Some(set) = data.app_store_locales() {
            let dir = storage.screenshots_dir(kind, slug, Store::AppStore)?;
            summary.merge(self.download_set(&dir, &set).await);
        }
        if let Some(set) = data.google_play_locales() {
            let dir = storage.screenshots_dir(kind, slug, Store::GooglePlay)?;
            summary.merge(self.download_set(&dir, &set).await);
        }

        info!(
            slug = %slug,
            downloaded = summary.downloaded.len(),
            failed = summary.failed.len(),
            "Screenshot download finished"
        );
        Ok(summary)
    }

    async fn download_set<T: LocaleEntry>(
        &self,
        screenshots_dir: &Path,
        set: &Multilingual<T>,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary::default();

        for (locale, entry) in set.iter() {
            if let Err(e) = validate_locale_dir(locale) {
                warn!(locale = %locale, error = %e, "Skipping screenshots for locale");
                for (_, sources) in entry.asset_groups() {
                    summary
                        .failed
                        .extend(sources.iter().map(|source| (source.clone(), e.to_string())));
                }
                continue;
            }

            for (asset_type, sources) in entry.asset_groups() {
                for (index, source) in sources.iter().enumerate() {
                    let file_name = format!("{}-{}.png", asset_type, index + 1);
                    let target = screenshots_dir.join(locale).join(file_name);

                    match self.fetch(source, &target).await {
                        Ok(()) => summary.downloaded.push(target),
                        Err(e) => {
                            warn!(source = %source, error = %e, "Failed to fetch screenshot");
                            summary.failed.push((source.clone(), e.to_string()));
                        }
                    }
                }
            }
        }

        summary
    }

    /// Copies a local file or downloads a URL to `target`, creating parent
    /// directories.
    pub async fn fetch(&self, source: &str, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MetadataError::file(parent, e))?;
        }

        if is_local_asset_path(source) {
            tokio::fs::copy(source, target)
                .await
                .map_err(|e| MetadataError::Download {
                    source_path: source.to_string(),
                    message: e.to_string(),
                })?;
            debug!(source = %source, target = %target.display(), "Copied local asset");
            return Ok(());
        }

        let url = resolve_app_store_image_url(source);
        let download_error = |message: String| MetadataError::Download {
            source_path: url.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;
        tokio::fs::write(target, &bytes)
            .await
            .map_err(|e| MetadataError::file(target, e))?;

        debug!(url = %url, target = %target.display(), bytes = bytes.len(), "Downloaded asset");
        Ok(())
    }
}
