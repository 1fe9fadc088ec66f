//! Registered apps
//!
//! Apps are kept in `<dataDir>/.aso/registered-apps.json` as `{"apps": [...]}`.
//! Writes are read-modify-write cycles serialized by an in-process mutex and
//! written through a temp file in the same directory, then renamed into place.

use pabal_metadata::storage::ASO_DIR;
use pabal_metadata::utils::merge_locales;
use pabal_metadata::Store;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::error::{RegistryError, Result};

/// Registry file name under `.aso/`
pub const REGISTRY_FILE: &str = "registered-apps.json";

/// App Store identifiers of a registered app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreEntry {
    pub bundle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_locales: Option<Vec<String>>,
}

/// Google Play identifiers of a registered app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayEntry {
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_locales: Option<Vec<String>>,
}

/// App known to pabal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredApp {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<AppStoreEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_play: Option<GooglePlayEntry>,
}

impl RegisteredApp {
    /// Whether `identifier` is this app's slug, bundle ID or package name
    pub fn matches(&self, identifier: &str) -> bool {
        self.slug == identifier
            || self
                .app_store
                .as_ref()
                .is_some_and(|entry| entry.bundle_id == identifier)
            || self
                .google_play
                .as_ref()
                .is_some_and(|entry| entry.package_name == identifier)
    }

    pub fn has_store(&self, store: Store) -> bool {
        match store {
            Store::AppStore => self.app_store.is_some(),
            Store::GooglePlay => self.google_play.is_some(),
        }
    }

    /// Cached supported locales for a store; `None` when never fetched
    pub fn supported_locales(&self, store: Store) -> Option<&[String]> {
        match store {
            Store::AppStore => self.app_store.as_ref()?.supported_locales.as_deref(),
            Store::GooglePlay => self.google_play.as_ref()?.supported_locales.as_deref(),
        }
    }

    fn matches_query(&self, needle: &str) -> bool {
        let contains = |value: &str| value.to_lowercase().contains(needle);
        contains(&self.slug)
            || contains(&self.name)
            || self
                .app_store
                .as_ref()
                .is_some_and(|entry| contains(&entry.bundle_id))
            || self
                .google_play
                .as_ref()
                .is_some_and(|entry| contains(&entry.package_name))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    apps: Vec<RegisteredApp>,
}

/// JSON-file backed registry of apps
#[derive(Debug)]
pub struct RegisteredAppsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RegisteredAppsStore {
    /// Registry under `<data_dir>/.aso/`
    pub fn new(data_dir: &Path) -> Self {
        Self::at(data_dir.join(ASO_DIR).join(REGISTRY_FILE))
    }

    /// Registry at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All registered apps in file order
    pub fn list(&self) -> Result<Vec<RegisteredApp>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read()?.apps)
    }

    /// First app whose slug, bundle ID or package name equals `identifier`
    pub fn find(&self, identifier: &str) -> Result<Option<RegisteredApp>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|app| app.matches(identifier)))
    }

    /// Like [`find`](Self::find) but a missing app is an error
    pub fn resolve(&self, identifier: &str) -> Result<RegisteredApp> {
        self.find(identifier)?
            .ok_or_else(|| RegistryError::AppNotFound(identifier.to_string()).into())
    }

    /// Add a new app
    pub fn register(&self, app: RegisteredApp) -> Result<RegisteredApp> {
        if app.slug.trim().is_empty() {
            return Err(RegistryError::InvalidApp("slug cannot be empty".to_string()).into());
        }
        if app.app_store.is_none() && app.google_play.is_none() {
            return Err(RegistryError::InvalidApp(format!(
                "app '{}' has neither an App Store nor a Google Play identifier",
                app.slug
            ))
            .into());
        }

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = self.read()?;
        if file.apps.iter().any(|existing| existing.slug == app.slug) {
            return Err(RegistryError::DuplicateSlug(app.slug).into());
        }

        file.apps.push(app.clone());
        self.write(&file)?;
        info!(slug = %app.slug, "registered app");
        Ok(app)
    }

    /// Read-modify-write one app
    pub fn update_app<F>(&self, identifier: &str, update: F) -> Result<RegisteredApp>
    where
        F: FnOnce(&mut RegisteredApp) -> Result<()>,
    {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = self.read()?;
        let app = file
            .apps
            .iter_mut()
            .find(|app| app.matches(identifier))
            .ok_or_else(|| RegistryError::AppNotFound(identifier.to_string()))?;

        update(app)?;
        let updated = app.clone();
        self.write(&file)?;
        debug!(slug = %updated.slug, "updated registered app");
        Ok(updated)
    }

    /// Merge `locales` into the cached supported locales of one store
    pub fn update_supported_locales(
        &self,
        identifier: &str,
        store: Store,
        locales: &[String],
    ) -> Result<RegisteredApp> {
        self.update_app(identifier, |app| {
            let cached = match store {
                Store::AppStore => app
                    .app_store
                    .as_mut()
                    .map(|entry| &mut entry.supported_locales),
                Store::GooglePlay => app
                    .google_play
                    .as_mut()
                    .map(|entry| &mut entry.supported_locales),
            };
            let Some(cached) = cached else {
                return Err(RegistryError::StoreNotRegistered {
                    identifier: identifier.to_string(),
                    store,
                }
                .into());
            };

            let existing = cached.take().unwrap_or_default();
            *cached = Some(merge_locales(&existing, locales));
            Ok(())
        })
    }

    /// Case-insensitive substring search; no query returns every app
    pub fn search(&self, query: Option<&str>) -> Result<Vec<RegisteredApp>> {
        let apps = self.list()?;
        let needle = query.map(str::trim).unwrap_or_default().to_lowercase();
        if needle.is_empty() {
            return Ok(apps);
        }
        Ok(apps
            .into_iter()
            .filter(|app| app.matches_query(&needle))
            .collect())
    }

    fn read(&self) -> Result<RegistryFile> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RegistryFile::default())
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        if content.trim().is_empty() {
            return Ok(RegistryFile::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            RegistryError::Parse {
                path: self.path.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn write(&self, file: &RegistryFile) -> Result<()> {
        let io_err = |source: std::io::Error| RegistryError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent).map_err(io_err)?;

        let json = serde_json::to_string_pretty(file).map_err(|e| RegistryError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(io_err)?;
        temp.write_all(json.as_bytes()).map_err(io_err)?;
        temp.write_all(b"\n").map_err(io_err)?;
        temp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, PabalError};
    use tempfile::TempDir;

    fn app_store_app(slug: &str, bundle_id: &str) -> RegisteredApp {
        RegisteredApp {
            slug: slug.to_string(),
            name: format!("{} app", slug),
            app_store: Some(AppStoreEntry {
                bundle_id: bundle_id.to_string(),
                ..Default::default()
            }),
            google_play: None,
        }
    }

    fn google_play_app(slug: &str, package_name: &str) -> RegisteredApp {
        RegisteredApp {
            slug: slug.to_string(),
            name: format!("{} app", slug),
            app_store: None,
            google_play: Some(GooglePlayEntry {
                package_name: package_name.to_string(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        assert!(store.list().unwrap().is_empty());
        assert!(store.find("anything").unwrap().is_none());
    }

    #[test]
    fn test_register_and_find() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store
            .register(app_store_app("notes", "com.example.notes"))
            .unwrap();

        assert!(temp
            .path()
            .join(".aso")
            .join("registered-apps.json")
            .exists());
        assert_eq!(store.find("notes").unwrap().unwrap().slug, "notes");
        assert_eq!(
            store.find("com.example.notes").unwrap().unwrap().slug,
            "notes"
        );
    }

    #[test]
    fn test_register_google_play_only() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store
            .register(google_play_app("player", "com.example.player"))
            .unwrap();

        let app = store.resolve("com.example.player").unwrap();
        assert!(app.app_store.is_none());
        assert!(app.has_store(Store::GooglePlay));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("appStore"));
        assert!(raw.contains("\"packageName\": \"com.example.player\""));
    }

    #[test]
    fn test_duplicate_slug_is_conflict() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store.register(app_store_app("dup", "com.a")).unwrap();

        let err = store.register(google_play_app("dup", "com.b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_register_requires_a_store() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        let app = RegisteredApp {
            slug: "bare".to_string(),
            name: "Bare".to_string(),
            app_store: None,
            google_play: None,
        };
        let err = store.register(app).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_first_match_wins() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store.register(app_store_app("first", "shared.id")).unwrap();
        store.register(google_play_app("second", "shared.id")).unwrap();

        assert_eq!(store.resolve("shared.id").unwrap().slug, "first");
    }

    #[test]
    fn test_update_supported_locales_merges() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store.register(app_store_app("notes", "com.n")).unwrap();

        store
            .update_supported_locales("notes", Store::AppStore, &["ko".into(), "ja".into()])
            .unwrap();
        let app = store
            .update_supported_locales("notes", Store::AppStore, &["en-US".into(), "ko".into()])
            .unwrap();

        assert_eq!(
            app.supported_locales(Store::AppStore).unwrap(),
            ["en-US", "ja", "ko"]
        );
    }

    #[test]
    fn test_update_locales_for_unregistered_store() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store.register(app_store_app("notes", "com.n")).unwrap();

        let err = store
            .update_supported_locales("notes", Store::GooglePlay, &["en-US".into()])
            .unwrap_err();
        assert!(matches!(
            err,
            PabalError::Registry(RegistryError::StoreNotRegistered { .. })
        ));

        let err = store
            .update_supported_locales("missing", Store::AppStore, &[])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_search() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        store
            .register(app_store_app("notes", "com.example.notes"))
            .unwrap();
        store
            .register(app_store_app("timer", "io.other.timer"))
            .unwrap();
        store
            .register(google_play_app("player", "com.example.player"))
            .unwrap();

        assert_eq!(store.search(None).unwrap().len(), 3);
        assert_eq!(store.search(Some("  ")).unwrap().len(), 3);

        let found = store.search(Some("io.other")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "timer");

        let found = store.search(Some("COM.EXAMPLE")).unwrap();
        let slugs: Vec<_> = found.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs, ["notes", "player"]);
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let store = RegisteredAppsStore::new(temp.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ broken").unwrap();

        let err = store.list().unwrap_err();
        assert!(matches!(
            err,
            PabalError::Registry(RegistryError::Parse { .. })
        ));
    }
}
