//! Google Play listing metadata.

use serde::{Deserialize, Serialize};

use super::common::LocaleEntry;

/// Screenshot sources grouped by device form factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayScreenshots {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tablet7: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tablet10: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tv: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wear: Vec<String>,
}

impl GooglePlayScreenshots {
    /// Form factor name paired with its Android Publisher image type.
    pub const IMAGE_TYPES: [(&'static str, &'static str); 5] = [
        ("phone", "phoneScreenshots"),
        ("tablet7", "sevenInchScreenshots"),
        ("tablet10", "tenInchScreenshots"),
        ("tv", "tvScreenshots"),
        ("wear", "wearScreenshots"),
    ];

    pub fn is_empty(&self) -> bool {
        self.phone.is_empty()
            && self.tablet7.is_empty()
            && self.tablet10.is_empty()
            && self.tv.is_empty()
            && self.wear.is_empty()
    }

    /// Sources for a form factor name.
    pub fn get(&self, form_factor: &str) -> Option<&Vec<String>> {
        match form_factor {
            "phone" => Some(&self.phone),
            "tablet7" => Some(&self.tablet7),
            "tablet10" => Some(&self.tablet10),
            "tv" => Some(&self.tv),
            "wear" => Some(&self.wear),
            _ => None,
        }
    }

    /// Mutable sources for a form factor name.
    pub fn get_mut(&mut self, form_factor: &str) -> Option<&mut Vec<String>> {
        match form_factor {
            "phone" => Some(&mut self.phone),
            "tablet7" => Some(&mut self.tablet7),
            "tablet10" => Some(&mut self.tablet10),
            "tv" => Some(&mut self.tv),
            "wear" => Some(&mut self.wear),
            _ => None,
        }
    }
}

/// Localized Google Play listing for one locale, plus app-wide details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlayLocaleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// App title (max 30 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Short description (max 80 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Full description (max 4000 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    /// Promo video URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "GooglePlayScreenshots::is_empty")]
    pub screenshots: GooglePlayScreenshots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_graphic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
}

impl GooglePlayLocaleData {
    /// Creates an empty record for `locale`.
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..Default::default()
        }
    }

    /// Whether any listing text field is set.
    pub fn has_listing_fields(&self) -> bool {
        self.title.is_some()
            || self.short_description.is_some()
            || self.full_description.is_some()
            || self.video.is_some()
    }

    /// Whether any app details field is set.
    pub fn has_details_fields(&self) -> bool {
        self.contact_email.is_some()
            || self.contact_website.is_some()
            || self.contact_phone.is_some()
            || self.default_language.is_some()
    }
}

impl LocaleEntry for GooglePlayLocaleData {
    fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    fn set_locale(&mut self, locale: &str) {
        self.locale = Some(locale.to_string());
    }

    fn strip_screenshots(&mut self) {
        self.screenshots = GooglePlayScreenshots::default();
        self.feature_graphic = None;
    }

    fn asset_groups(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = GooglePlayScreenshots::IMAGE_TYPES
            .iter()
            .filter_map(|(form_factor, _)| {
                self.screenshots
                    .get(form_factor)
                    .filter(|sources| !sources.is_empty())
                    .map(|sources| (form_factor.to_string(), sources.clone()))
            })
            .collect();

        if let Some(graphic) = &self.feature_graphic {
            groups.push(("featureGraphic".to_string(), vec![graphic.clone()]));
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_groups_skip_empty() {
        let mut data = GooglePlayLocaleData::new("en-US");
        data.screenshots.phone = vec!["a.png".to_string(), "b.png".to_string()];
        data.feature_graphic = Some("https://example.com/fg.png".to_string());

        let groups = data.asset_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "phone");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "featureGraphic");
    }

    #[test]
    fn test_strip_screenshots_removes_graphic() {
        let mut data = GooglePlayLocaleData::new("en-US");
        data.screenshots.tv = vec!["tv.png".to_string()];
        data.feature_graphic = Some("fg.png".to_string());
        data.strip_screenshots();
        assert!(data.asset_groups().is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let json = r#"{"locale":"ko-KR","title":"앱","shortDescription":"짧은","contactEmail":"a@b.c"}"#;
        let data: GooglePlayLocaleData = serde_json::from_str(json).unwrap();
        assert_eq!(data.short_description.as_deref(), Some("짧은"));
        assert!(data.has_listing_fields());
        assert!(data.has_details_fields());

        let value = serde_json::to_value(&data).unwrap();
        assert!(value.get("screenshots").is_none());
        assert_eq!(value["contactEmail"], "a@b.c");
    }
}
