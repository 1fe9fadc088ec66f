//! Store client traits
//!
//! Clients are per account rather than per app: every call names the app it
//! operates on (App Store app id or Google Play package name).

use crate::error::{Result, StoreError};
use crate::types::*;
use pabal_metadata::{AppStoreLocaleData, GooglePlayLocaleData, Multilingual};
use std::collections::BTreeMap;

/// App Store Connect operations used by pabal
#[async_trait::async_trait]
pub trait AppStoreApi: Send + Sync {
    /// Verify the credentials against the API
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Look up an app by bundle ID
    async fn find_app(&self, bundle_id: &str) -> Result<Option<AppStoreApp>>;

    /// List versions of an app, newest version string first
    async fn list_versions(&self, app_id: &str) -> Result<Vec<AppStoreVersion>>;

    /// Newest version of an app
    async fn latest_version(&self, app_id: &str) -> Result<Option<AppStoreVersion>> {
        Ok(self.list_versions(app_id).await?.into_iter().next())
    }

    /// Pull every localization of the app info and current version
    async fn pull_all_locales(&self, app_id: &str) -> Result<Multilingual<AppStoreLocaleData>>;

    /// Pull a single locale, or the default locale when none is given
    async fn pull_metadata(
        &self,
        app_id: &str,
        locale: Option<&str>,
    ) -> Result<AppStoreLocaleData> {
        let all = self.pull_all_locales(app_id).await?;
        let locale = locale.unwrap_or_else(|| all.default_locale()).to_string();
        all.get(&locale)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Locale {} not found", locale)))
    }

    /// Push one locale's listing
    ///
    /// Name and subtitle failures are reported in the outcome; a failing
    /// version localization update is returned as an error.
    async fn push_metadata(&self, app_id: &str, data: &AppStoreLocaleData) -> Result<PushOutcome>;

    /// Create a new App Store version
    async fn create_version(
        &self,
        app_id: &str,
        version_string: &str,
        platform: &str,
    ) -> Result<AppStoreVersion>;

    /// Set what's new text per locale on a version (latest when `version_id` is None)
    async fn update_release_notes(
        &self,
        app_id: &str,
        version_id: Option<&str>,
        notes: &BTreeMap<String, String>,
    ) -> Result<LocaleUpdateReport>;

    /// Locales the app currently has localizations for
    async fn supported_locales(&self, app_id: &str) -> Result<Vec<String>>;
}

/// Google Play Developer API operations used by pabal
#[async_trait::async_trait]
pub trait GooglePlayApi: Send + Sync {
    /// Verify the service account can obtain an access token
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Look up an app by package name
    async fn find_app(&self, package_name: &str) -> Result<Option<GooglePlayApp>>;

    /// Pull every listing and the app details
    async fn pull_all_locales(
        &self,
        package_name: &str,
    ) -> Result<Multilingual<GooglePlayLocaleData>>;

    /// Pull a single locale, or the default language when none is given
    async fn pull_metadata(
        &self,
        package_name: &str,
        locale: Option<&str>,
    ) -> Result<GooglePlayLocaleData> {
        let all = self.pull_all_locales(package_name).await?;
        let locale = locale.unwrap_or_else(|| all.default_locale()).to_string();
        all.get(&locale)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Locale {} not found", locale)))
    }

    /// Push listings inside one edit
    ///
    /// The edit is committed when at least one locale was applied.
    async fn push_metadata(
        &self,
        package_name: &str,
        data: &Multilingual<GooglePlayLocaleData>,
    ) -> Result<LocaleUpdateReport>;

    /// Releases on a track, newest version code first
    async fn list_releases(&self, package_name: &str, track: &str)
        -> Result<Vec<GooglePlayRelease>>;

    /// Newest release on a track
    async fn latest_release(
        &self,
        package_name: &str,
        track: &str,
    ) -> Result<Option<GooglePlayRelease>> {
        Ok(self
            .list_releases(package_name, track)
            .await?
            .into_iter()
            .next())
    }

    /// Create a draft release for already uploaded version codes
    async fn create_release(
        &self,
        package_name: &str,
        track: &str,
        version_codes: &[String],
        release_name: Option<&str>,
    ) -> Result<GooglePlayRelease>;

    /// Set release notes on the newest release of a track, or on the
    /// release containing `version_code`
    async fn update_release_notes(
        &self,
        package_name: &str,
        track: &str,
        version_code: Option<&str>,
        notes: &BTreeMap<String, String>,
    ) -> Result<LocaleUpdateReport>;

    /// Locales the app has listings for
    async fn supported_locales(&self, package_name: &str) -> Result<Vec<String>>;
}
