//! App Store listing metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common::LocaleEntry;

/// Localized App Store listing for one locale.
///
/// `name` and `subtitle` live on the app info localization; every other
/// text field lives on the version localization of the current version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreLocaleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// App name (max 30 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Subtitle (max 30 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Comma-separated keywords (max 100 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_policy_url: Option<String>,
    /// Release notes of the current version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
    /// Screenshot sources keyed by display type (e.g. `APP_IPHONE_67`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub screenshots: BTreeMap<String, Vec<String>>,
}

impl AppStoreLocaleData {
    /// Creates an empty record for `locale`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..Default::default()
        }
    }

    /// Whether any field stored on the app info localization is set.
    pub fn has_app_info_fields(&self) -> bool {
        self.name.is_some() || self.subtitle.is_some()
    }

    /// Whether any field stored on the version localization is set.
    pub fn has_version_fields(&self) -> bool {
        self.description.is_some()
            || self.keywords.is_some()
            || self.promotional_text.is_some()
            || self.support_url.is_some()
            || self.marketing_url.is_some()
            || self.whats_new.is_some()
    }
}

impl LocaleEntry for AppStoreLocaleData {
    fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    fn set_locale(&mut self, locale: &str) {
        self.locale = Some(locale.to_string());
    }

    fn strip_screenshots(&mut self) {
        self.screenshots.clear();
    }

    fn asset_groups(&self) -> Vec<(String, Vec<String>)> {
        self.screenshots
            .iter()
            .filter(|(_, sources)| !sources.is_empty())
            .map(|(display_type, sources)| (display_type.clone(), sources.clone()))
            .collect()
    }
}
