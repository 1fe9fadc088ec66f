//! Local ASO cache.
//!
//! ## File Structure
//!
//! ```text
//! <data dir>/.aso/
//! ├── pullData/products/<slug>/
//! │   ├── release-notes.json
//! │   └── store/
//! │       ├── app-store/
//! │       │   ├── aso-data.json
//! │       │   └── screenshots/<locale>/<type>-<n>.png
//! │       └── google-play/
//! │           └── aso-data.json
//! └── pushData/products/<slug>/store/...
//! ```
//!
//! Each `aso-data.json` holds the store's section of [`AsoData`] in
//! multilingual form. Writes are last-write-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::aso::AsoData;
use crate::types::common::Store;
use crate::types::release_notes::ReleaseNote;
use crate::{MetadataError, Result};

/// Directory under the data dir that holds all pabal state.
pub const ASO_DIR: &str = ".aso";
const ASO_DATA_FILE: &str = "aso-data.json";
const RELEASE_NOTES_FILE: &str = "release-notes.json";

/// Which side of the cache to read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Data as last pulled from the stores.
    Pull,
    /// Editable working copy used by push.
    Push,
}

impl DataKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DataKind::Pull => "pullData",
            DataKind::Push => "pushData",
        }
    }
}

/// Validates a product slug for use as a directory name.
pub fn validate_slug(slug: &str) -> Result<()> {
    validate_dir_name("product slug", slug)
}

/// Validates a locale key for use as a screenshot directory name.
pub fn validate_locale_dir(locale: &str) -> Result<()> {
    validate_dir_name("locale", locale)
}

fn validate_dir_name(what: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MetadataError::InvalidFormat(format!("{} cannot be empty", what)));
    }
    if name == "." || name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(MetadataError::InvalidFormat(format!(
            "Invalid {} '{}': must not contain path separators or '..'",
            what, name
        )));
    }
    Ok(())
}

/// File-backed ASO cache rooted at a data directory.
#[derive(Debug, Clone)]
pub struct AsoStorage {
    data_dir: PathBuf,
}

impl AsoStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data dir>/.aso`
    pub fn aso_root(&self) -> PathBuf {
        self.data_dir.join(ASO_DIR)
    }

    pub fn product_dir(&self, kind: DataKind, slug: &str) -> Result<PathBuf> {
        validate_slug(slug)?;
        Ok(self
            .aso_root()
            .join(kind.dir_name())
            .join("products")
            .join(slug.trim()))
    }

    pub fn store_dir(&self, kind: DataKind, slug: &str, store: Store) -> Result<PathBuf> {
        Ok(self
            .product_dir(kind, slug)?
            .join("store")
            .join(store.dir_name()))
    }

    pub fn aso_data_path(&self, kind: DataKind, slug: &str, store: Store) -> Result<PathBuf> {
        Ok(self.store_dir(kind, slug, store)?.join(ASO_DATA_FILE))
    }

    pub fn screenshots_dir(&self, kind: DataKind, slug: &str, store: Store) -> Result<PathBuf> {
        Ok(self.store_dir(kind, slug, store)?.join("screenshots"))
    }

    pub fn release_notes_path(&self, slug: &str) -> Result<PathBuf> {
        Ok(self
            .product_dir(DataKind::Pull, slug)?
            .join(RELEASE_NOTES_FILE))
    }

    /// Whether any store file exists for the product.
    pub fn exists(&self, kind: DataKind, slug: &str) -> bool {
        Store::ALL.iter().any(|store| {
            self.aso_data_path(kind, slug, *store)
                .map(|path| path.is_file())
                .unwrap_or(false)
        })
    }

    /// Saves ASO data in normalized form, one file per present store.
    ///
    /// Returns the written paths.
    pub async fn save_aso_data(
        &self,
        kind: DataKind,
        slug: &str,
        data: &AsoData,
    ) -> Result<Vec<PathBuf>> {
        let data = data.clone().normalize();
        let mut written = Vec::new();

        for store in Store::ALL {
            if !data.has_store(store) {
                continue;
            }
            let section = data.clone().retain_stores(&[store]);
            let path = self.aso_data_path(kind, slug, store)?;
            write_json(&path, &section).await?;
            written.push(path);
        }

        info!(
            slug = %slug,
            kind = kind.dir_name(),
            files = written.len(),
            "Saved ASO data"
        );
        Ok(written)
    }

    /// Loads ASO data for a product, combining both store files.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::NotFound`] if neither store file exists.
    pub async fn load_aso_data(&self, kind: DataKind, slug: &str) -> Result<AsoData> {
        let mut data = AsoData::default();
        let mut found = false;

        for store in Store::ALL {
            let path = self.aso_data_path(kind, slug, store)?;
            if !path.is_file() {
                continue;
            }
            let section: AsoData = read_json(&path).await?;
            found = true;
            match store {
                Store::AppStore => data.app_store = section.app_store,
                Store::GooglePlay => data.google_play = section.google_play,
            }
        }

        if !found {
            return Err(MetadataError::NotFound(format!(
                "No {} ASO data for '{}'",
                kind.dir_name(),
                slug
            )));
        }

        Ok(data.normalize())
    }

    /// Copies a product's cache from one side to the other.
    ///
    /// Existing files at the destination are replaced. Returns the number of
    /// files copied.
    pub async fn copy_product(&self, slug: &str, from: DataKind, to: DataKind) -> Result<usize> {
        let source_root = self.product_dir(from, slug)?;
        let target_root = self.product_dir(to, slug)?;

        if !source_root.is_dir() {
            return Err(MetadataError::NotFound(format!(
                "No {} directory for '{}'",
                from.dir_name(),
                slug
            )));
        }

        let mut copied = 0;
        let mut pending = vec![source_root.clone()];

        while let Some(dir) = pending.pop() {
            let relative = dir.strip_prefix(&source_root).unwrap_or(Path::new(""));
            let target_dir = target_root.join(relative);
            tokio::fs::create_dir_all(&target_dir)
                .await
                .map_err(|e| MetadataError::file(&target_dir, e))?;

            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| MetadataError::file(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| MetadataError::file(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| MetadataError::file(&path, e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let target = target_dir.join(entry.file_name());
                    tokio::fs::copy(&path, &target)
                        .await
                        .map_err(|e| MetadataError::file(&target, e))?;
                    copied += 1;
                }
            }
        }

        info!(
            slug = %slug,
            from = from.dir_name(),
            to = to.dir_name(),
            files = copied,
            "Copied product cache"
        );
        Ok(copied)
    }

    pub async fn save_release_notes(&self, slug: &str, notes: &[ReleaseNote]) -> Result<PathBuf> {
        let path = self.release_notes_path(slug)?;
        write_json(&path, &notes).await?;
        info!(slug = %slug, count = notes.len(), "Saved release notes");
        Ok(path)
    }

    /// Loads cached release notes; a missing file yields an empty list.
    pub async fn load_release_notes(&self, slug: &str) -> Result<Vec<ReleaseNote>> {
        let path = self.release_notes_path(slug)?;
        if !path.is_file() {
            return Ok(Vec::new());
        }
        read_json(&path).await
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| MetadataError::file(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| MetadataError::file(path, e))?;
    debug!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| MetadataError::file(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        MetadataError::InvalidFormat(format!("Failed to parse {}: {}", path.display(), e))
    })
}
