//! In-memory store clients for tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use pabal_metadata::{AppStoreLocaleData, GooglePlayLocaleData, Multilingual};
use pabal_stores::error::Result;
use pabal_stores::{
    sort_versions, AppStoreApi, AppStoreApp, AppStoreVersion, AuthStatus, GooglePlayApi,
    FieldFailure, GooglePlayApp, GooglePlayRelease, LocaleUpdateReport, PushOutcome, StoreError,
};

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// App Store Connect stand-in
#[derive(Default)]
pub struct MockAppStore {
    apps: Vec<AppStoreApp>,
    locales: Option<Multilingual<AppStoreLocaleData>>,
    versions: Mutex<Vec<AppStoreVersion>>,
    state_conflict: bool,
    auth_error: Option<String>,
    field_failures: Vec<(String, String)>,
    pushed: Mutex<Vec<AppStoreLocaleData>>,
    created_versions: Mutex<Vec<String>>,
    release_notes: Mutex<Vec<(Option<String>, BTreeMap<String, String>)>>,
}

impl MockAppStore {
    pub fn with_app(mut self, id: &str, bundle_id: &str, name: &str) -> Self {
        self.apps.push(AppStoreApp {
            id: id.to_string(),
            name: name.to_string(),
            bundle_id: bundle_id.to_string(),
            primary_locale: Some("en-US".to_string()),
        });
        self
    }

    pub fn with_locales(mut self, locales: Multilingual<AppStoreLocaleData>) -> Self {
        self.locales = Some(locales);
        self
    }

    pub fn with_version(self, id: &str, version_string: &str, state: &str) -> Self {
        locked(&self.versions).push(AppStoreVersion {
            id: id.to_string(),
            version_string: version_string.to_string(),
            app_store_state: state.to_string(),
            platform: "IOS".to_string(),
            created_date: None,
        });
        self
    }

    /// Every version localization push answers 409 STATE_ERROR
    pub fn with_state_conflict(mut self) -> Self {
        self.state_conflict = true;
        self
    }

    pub fn with_auth_error(mut self, message: &str) -> Self {
        self.auth_error = Some(message.to_string());
        self
    }

    /// `field` is rejected whenever `locale` is pushed; the rest of the locale goes through
    pub fn with_field_failure(mut self, locale: &str, field: &str) -> Self {
        self.field_failures
            .push((locale.to_string(), field.to_string()));
        self
    }

    pub fn pushed(&self) -> Vec<AppStoreLocaleData> {
        locked(&self.pushed).clone()
    }

    pub fn created_versions(&self) -> Vec<String> {
        locked(&self.created_versions).clone()
    }

    /// `(version id, notes)` for every release notes update
    pub fn release_note_updates(&self) -> Vec<(Option<String>, BTreeMap<String, String>)> {
        locked(&self.release_notes).clone()
    }
}

#[async_trait::async_trait]
impl AppStoreApi for MockAppStore {
    async fn check_auth(&self) -> Result<AuthStatus> {
        match &self.auth_error {
            Some(message) => Err(StoreError::AuthenticationFailed(message.clone())),
            None => Ok(AuthStatus {
                account: "issuer/KEY".to_string(),
                detail: format!("{} app(s) visible", self.apps.len()),
            }),
        }
    }

    async fn find_app(&self, bundle_id: &str) -> Result<Option<AppStoreApp>> {
        Ok(self
            .apps
            .iter()
            .find(|app| app.bundle_id == bundle_id)
            .cloned())
    }

    async fn list_versions(&self, _app_id: &str) -> Result<Vec<AppStoreVersion>> {
        let mut versions = locked(&self.versions).clone();
        sort_versions(&mut versions, |v| v.version_string.as_str());
        Ok(versions)
    }

    async fn pull_all_locales(&self, app_id: &str) -> Result<Multilingual<AppStoreLocaleData>> {
        self.locales
            .clone()
            .ok_or_else(|| StoreError::NotFound(format!("App {} has no localizations", app_id)))
    }

    async fn push_metadata(&self, _app_id: &str, data: &AppStoreLocaleData) -> Result<PushOutcome> {
        if self.state_conflict && data.has_version_fields() {
            return Err(StoreError::from_response(
                409,
                r#"{"errors":[{"code":"STATE_ERROR"}]}"#.to_string(),
            ));
        }
        locked(&self.pushed).push(data.clone());

        let locale = data.locale.as_deref().unwrap_or_default();
        Ok(PushOutcome {
            failed_fields: self
                .field_failures
                .iter()
                .filter(|(failing, _)| failing == locale)
                .map(|(_, field)| FieldFailure {
                    field: field.clone(),
                    error: format!("{} rejected for {}", field, locale),
                })
                .collect(),
        })
    }

    async fn create_version(
        &self,
        _app_id: &str,
        version_string: &str,
        platform: &str,
    ) -> Result<AppStoreVersion> {
        let version = AppStoreVersion {
            id: format!("new-{}", version_string),
            version_string: version_string.to_string(),
            app_store_state: "PREPARE_FOR_SUBMISSION".to_string(),
            platform: platform.to_string(),
            created_date: None,
        };
        locked(&self.versions).push(version.clone());
        locked(&self.created_versions).push(version_string.to_string());
        Ok(version)
    }

    async fn update_release_notes(
        &self,
        _app_id: &str,
        version_id: Option<&str>,
        notes: &BTreeMap<String, String>,
    ) -> Result<LocaleUpdateReport> {
        locked(&self.release_notes).push((version_id.map(str::to_string), notes.clone()));
        Ok(LocaleUpdateReport {
            updated: notes.keys().cloned().collect(),
            failed: Vec::new(),
        })
    }

    async fn supported_locales(&self, _app_id: &str) -> Result<Vec<String>> {
        Ok(self
            .locales
            .as_ref()
            .map(Multilingual::locale_codes)
            .unwrap_or_default())
    }
}

/// Google Play stand-in
#[derive(Default)]
pub struct MockGooglePlay {
    apps: Vec<GooglePlayApp>,
    locales: Option<Multilingual<GooglePlayLocaleData>>,
    releases: Mutex<Vec<GooglePlayRelease>>,
    pushed: Mutex<Vec<Multilingual<GooglePlayLocaleData>>>,
    release_notes: Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

impl MockGooglePlay {
    pub fn with_app(mut self, package_name: &str, title: &str) -> Self {
        self.apps.push(GooglePlayApp {
            package_name: package_name.to_string(),
            title: Some(title.to_string()),
            default_language: Some("en-US".to_string()),
        });
        self
    }

    pub fn with_locales(mut self, locales: Multilingual<GooglePlayLocaleData>) -> Self {
        self.locales = Some(locales);
        self
    }

    pub fn with_release(self, track: &str, version_code: &str, name: &str) -> Self {
        locked(&self.releases).push(GooglePlayRelease {
            track: track.to_string(),
            version_codes: vec![version_code.to_string()],
            status: "completed".to_string(),
            release_name: Some(name.to_string()),
            release_notes: BTreeMap::new(),
        });
        self
    }

    pub fn pushed(&self) -> Vec<Multilingual<GooglePlayLocaleData>> {
        locked(&self.pushed).clone()
    }

    /// `(track, notes)` for every release notes update
    pub fn release_note_updates(&self) -> Vec<(String, BTreeMap<String, String>)> {
        locked(&self.release_notes).clone()
    }
}

#[async_trait::async_trait]
impl GooglePlayApi for MockGooglePlay {
    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus {
            account: "ci@demo-project.iam.gserviceaccount.com".to_string(),
            detail: "access token issued".to_string(),
        })
    }

    async fn find_app(&self, package_name: &str) -> Result<Option<GooglePlayApp>> {
        Ok(self
            .apps
            .iter()
            .find(|app| app.package_name == package_name)
            .cloned())
    }

    async fn pull_all_locales(
        &self,
        package_name: &str,
    ) -> Result<Multilingual<GooglePlayLocaleData>> {
        self.locales
            .clone()
            .ok_or_else(|| StoreError::NotFound(format!("Package {} not found", package_name)))
    }

    async fn push_metadata(
        &self,
        _package_name: &str,
        data: &Multilingual<GooglePlayLocaleData>,
    ) -> Result<LocaleUpdateReport> {
        locked(&self.pushed).push(data.clone());
        Ok(LocaleUpdateReport {
            updated: data.locale_codes(),
            failed: Vec::new(),
        })
    }

    async fn list_releases(
        &self,
        _package_name: &str,
        track: &str,
    ) -> Result<Vec<GooglePlayRelease>> {
        let mut releases: Vec<GooglePlayRelease> = locked(&self.releases)
            .iter()
            .filter(|release| release.track == track)
            .cloned()
            .collect();
        releases.sort_by_key(|release| std::cmp::Reverse(release.max_version_code()));
        Ok(releases)
    }

    async fn create_release(
        &self,
        _package_name: &str,
        track: &str,
        version_codes: &[String],
        release_name: Option<&str>,
    ) -> Result<GooglePlayRelease> {
        if version_codes.is_empty() {
            return Err(StoreError::InvalidInput(
                "At least one version code is required".to_string(),
            ));
        }
        let release = GooglePlayRelease {
            track: track.to_string(),
            version_codes: version_codes.to_vec(),
            status: "draft".to_string(),
            release_name: release_name.map(str::to_string),
            release_notes: BTreeMap::new(),
        };
        locked(&self.releases).push(release.clone());
        Ok(release)
    }

    async fn update_release_notes(
        &self,
        _package_name: &str,
        track: &str,
        _version_code: Option<&str>,
        notes: &BTreeMap<String, String>,
    ) -> Result<LocaleUpdateReport> {
        locked(&self.release_notes).push((track.to_string(), notes.clone()));
        Ok(LocaleUpdateReport {
            updated: notes.keys().cloned().collect(),
            failed: Vec::new(),
        })
    }

    async fn supported_locales(&self, _package_name: &str) -> Result<Vec<String>> {
        Ok(self
            .locales
            .as_ref()
            .map(Multilingual::locale_codes)
            .unwrap_or_default())
    }
}
