//! Android Publisher API payloads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::GooglePlayRelease;

/// Google service account credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

/// OAuth token response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct EditResponse {
    pub id: String,
}

/// App-wide details
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingsResponse {
    #[serde(default)]
    pub listings: Vec<Listing>,
}

/// Store listing for one language
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Track {
    pub track: String,
    #[serde(default)]
    pub releases: Vec<TrackRelease>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRelease {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub version_codes: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub release_notes: Vec<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_fraction: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalizedText {
    pub language: String,
    pub text: String,
}

impl TrackRelease {
    pub fn to_release(&self, track: &str) -> GooglePlayRelease {
        GooglePlayRelease {
            track: track.to_string(),
            version_codes: self.version_codes.clone(),
            status: self.status.clone(),
            release_name: self.name.clone(),
            release_notes: self
                .release_notes
                .iter()
                .map(|note| (note.language.clone(), note.text.clone()))
                .collect(),
        }
    }

    /// Replaces notes for the given languages, keeping the others.
    pub fn merge_release_notes(&mut self, notes: &BTreeMap<String, String>) {
        let mut merged: BTreeMap<String, String> = self
            .release_notes
            .drain(..)
            .map(|note| (note.language, note.text))
            .collect();
        merged.extend(notes.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.release_notes = merged
            .into_iter()
            .map(|(language, text)| LocalizedText { language, text })
            .collect();
    }

    pub fn contains_version_code(&self, version_code: &str) -> bool {
        self.version_codes.iter().any(|code| code == version_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_parsing() {
        let json = r#"{
            "track": "production",
            "releases": [{
                "name": "1.2.0",
                "versionCodes": ["120"],
                "status": "completed",
                "releaseNotes": [{"language": "en-US", "text": "Fixes"}]
            }]
        }"#;
        let track: Track = serde_json::from_str(json).unwrap();
        let release = track.releases[0].to_release(&track.track);
        assert_eq!(release.release_name.as_deref(), Some("1.2.0"));
        assert_eq!(release.release_notes["en-US"], "Fixes");
        assert!(track.releases[0].contains_version_code("120"));
    }

    #[test]
    fn test_merge_release_notes() {
        let mut release = TrackRelease {
            release_notes: vec![
                LocalizedText {
                    language: "en-US".to_string(),
                    text: "Old".to_string(),
                },
                LocalizedText {
                    language: "de-DE".to_string(),
                    text: "Alt".to_string(),
                },
            ],
            ..Default::default()
        };

        let mut notes = BTreeMap::new();
        notes.insert("en-US".to_string(), "New".to_string());
        notes.insert("ko-KR".to_string(), "새".to_string());
        release.merge_release_notes(&notes);

        let release = release.to_release("beta");
        assert_eq!(release.release_notes.len(), 3);
        assert_eq!(release.release_notes["en-US"], "New");
        assert_eq!(release.release_notes["de-DE"], "Alt");
    }

    #[test]
    fn test_listing_patch_skips_missing_fields() {
        let listing = Listing {
            language: "en-US".to_string(),
            title: Some("App".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&listing).unwrap();
        assert!(value.get("shortDescription").is_none());
        assert_eq!(value["title"], "App");
    }
}
