//! Common types for store clients

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// App Store Connect API credentials
#[derive(Debug, Clone, PartialEq)]
pub struct AppStoreConfig {
    /// Issuer ID (from App Store Connect > Users and Access > Keys)
    pub issuer_id: String,

    /// API key ID
    pub key_id: String,

    /// Path to the `.p8` private key
    pub private_key_path: PathBuf,
}

/// Google Play Developer API credentials
#[derive(Debug, Clone, PartialEq)]
pub struct GooglePlayConfig {
    /// Path to the service account JSON key
    pub service_account_key_path: PathBuf,
}

/// Result of a credential check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    /// Who the credentials identify (issuer/key or service account email)
    pub account: String,

    /// Extra detail reported by the store
    pub detail: String,
}

/// App found on App Store Connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreApp {
    pub id: String,
    pub name: String,
    pub bundle_id: String,
    pub primary_locale: Option<String>,
}

/// App found on Google Play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayApp {
    pub package_name: String,
    /// Listing title in the default language, when a listing exists
    pub title: Option<String>,
    pub default_language: Option<String>,
}

/// App Store version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreVersion {
    pub id: String,
    pub version_string: String,
    pub app_store_state: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

impl AppStoreVersion {
    /// Whether the version's metadata can still be changed.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.app_store_state.as_str(),
            "PREPARE_FOR_SUBMISSION"
                | "DEVELOPER_REJECTED"
                | "REJECTED"
                | "METADATA_REJECTED"
                | "INVALID_BINARY"
        )
    }
}

/// Release on a Google Play track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayRelease {
    pub track: String,
    pub version_codes: Vec<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    #[serde(default)]
    pub release_notes: BTreeMap<String, String>,
}

impl GooglePlayRelease {
    /// Highest version code in the release.
    pub fn max_version_code(&self) -> i64 {
        self.version_codes
            .iter()
            .filter_map(|code| code.parse::<i64>().ok())
            .max()
            .unwrap_or(0)
    }
}

/// Tracks reported by `release-check-versions`
pub const GOOGLE_PLAY_TRACKS: [&str; 4] = ["production", "beta", "alpha", "internal"];

/// Locale that failed to update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleFailure {
    pub locale: String,
    pub error: String,
}

/// Per-locale outcome of a release notes or listing update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleUpdateReport {
    pub updated: Vec<String>,
    pub failed: Vec<LocaleFailure>,
}

impl LocaleUpdateReport {
    pub fn record_failure(&mut self, locale: impl Into<String>, error: impl ToString) {
        self.failed.push(LocaleFailure {
            locale: locale.into(),
            error: error.to_string(),
        });
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Field that could not be pushed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFailure {
    pub field: String,
    pub error: String,
}

/// Outcome of pushing one App Store locale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_fields: Vec<FieldFailure>,
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        self.failed_fields.is_empty()
    }
}
