//! Per-product ASO data covering both stores.

use serde::{Deserialize, Serialize};

use super::apple::AppStoreLocaleData;
use super::common::{LocaleEntry, LocalizedSet, Multilingual, Store};
use super::google_play::GooglePlayLocaleData;

/// ASO metadata for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_play: Option<LocalizedSet<GooglePlayLocaleData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<LocalizedSet<AppStoreLocaleData>>,
}

impl AsoData {
    /// Converts both sections to multilingual form.
    pub fn normalize(self) -> Self {
        Self {
            google_play: self
                .google_play
                .map(|set| LocalizedSet::Multilingual(set.into_multilingual())),
            app_store: self
                .app_store
                .map(|set| LocalizedSet::Multilingual(set.into_multilingual())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.google_play.is_none() && self.app_store.is_none()
    }

    /// Whether data for `store` is present.
    pub fn has_store(&self, store: Store) -> bool {
        match store {
            Store::AppStore => self.app_store.is_some(),
            Store::GooglePlay => self.google_play.is_some(),
        }
    }

    /// App Store section in multilingual form.
    pub fn app_store_locales(&self) -> Option<Multilingual<AppStoreLocaleData>> {
        self.app_store.clone().map(LocalizedSet::into_multilingual)
    }

    /// Google Play section in multilingual form.
    pub fn google_play_locales(&self) -> Option<Multilingual<GooglePlayLocaleData>> {
        self.google_play.clone().map(LocalizedSet::into_multilingual)
    }

    /// Locale codes present for `store`.
    pub fn locale_codes(&self, store: Store) -> Vec<String> {
        match store {
            Store::AppStore => self
                .app_store
                .as_ref()
                .map(LocalizedSet::locale_codes)
                .unwrap_or_default(),
            Store::GooglePlay => self
                .google_play
                .as_ref()
                .map(LocalizedSet::locale_codes)
                .unwrap_or_default(),
        }
    }

    /// Drops every screenshot and graphic reference, normalizing on the way.
    pub fn strip_screenshots(self) -> Self {
        let mut data = self.normalize();
        if let Some(LocalizedSet::Multilingual(set)) = data.app_store.as_mut() {
            set.values_mut().for_each(LocaleEntry::strip_screenshots);
        }
        if let Some(LocalizedSet::Multilingual(set)) = data.google_play.as_mut() {
            set.values_mut().for_each(LocaleEntry::strip_screenshots);
        }
        data
    }

    /// Keeps only the sections for the given stores.
    pub fn retain_stores(mut self, stores: &[Store]) -> Self {
        if !stores.contains(&Store::AppStore) {
            self.app_store = None;
        }
        if !stores.contains(&Store::GooglePlay) {
            self.google_play = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mixed() {
        let json = r#"{
            "appStore": {"locale": "ko", "name": "앱"},
            "googlePlay": {"locales": {"en-US": {"title": "App"}}, "defaultLocale": "en-US"}
        }"#;
        let data: AsoData = serde_json::from_str(json).unwrap();
        assert!(matches!(data.app_store, Some(LocalizedSet::Single(_))));

        let data = data.normalize();
        let app_store = data.app_store_locales().unwrap();
        assert_eq!(app_store.default_locale(), "ko");
        assert_eq!(data.locale_codes(Store::GooglePlay), vec!["en-US"]);
    }

    #[test]
    fn test_strip_screenshots() {
        let json = r#"{
            "appStore": {"locales": {"en-US": {"screenshots": {"APP_IPHONE_67": ["a.png"]}}}},
            "googlePlay": {"locale": "en-US", "featureGraphic": "fg.png"}
        }"#;
        let data: AsoData = serde_json::from_str(json).unwrap();
        let data = data.strip_screenshots();
        let app_store = data.app_store_locales().unwrap();
        assert!(app_store.get("en-US").unwrap().screenshots.is_empty());
        let google_play = data.google_play_locales().unwrap();
        assert!(google_play.get("en-US").unwrap().feature_graphic.is_none());
    }

    #[test]
    fn test_retain_stores() {
        let data = AsoData {
            app_store: Some(Multilingual::single("en-US", AppStoreLocaleData::new("en-US")).into()),
            google_play: Some(
                Multilingual::single("en-US", GooglePlayLocaleData::new("en-US")).into(),
            ),
        };
        let data = data.retain_stores(&[Store::GooglePlay]);
        assert!(!data.has_store(Store::AppStore));
        assert!(data.has_store(Store::GooglePlay));
    }
}
