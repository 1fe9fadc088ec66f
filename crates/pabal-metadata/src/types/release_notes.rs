//! Release notes cached per product.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common::Store;

/// Release notes of one store release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNote {
    pub platform: Store,
    /// App Store version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
    /// Google Play version code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_code: Option<i64>,
    /// Release notes keyed by locale.
    #[serde(default)]
    pub release_notes: BTreeMap<String, String>,
}

impl ReleaseNote {
    /// Human-readable version label.
    pub fn version_label(&self) -> String {
        match (&self.version_string, self.version_code) {
            (Some(version), _) => version.clone(),
            (None, Some(code)) => format!("versionCode {}", code),
            (None, None) => "unknown".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_note_json() {
        let json = r#"{"platform":"googlePlay","versionCode":42,"releaseNotes":{"en-US":"Fixes"}}"#;
        let note: ReleaseNote = serde_json::from_str(json).unwrap();
        assert_eq!(note.platform, Store::GooglePlay);
        assert_eq!(note.version_label(), "versionCode 42");
        assert_eq!(note.release_notes["en-US"], "Fixes");
    }
}
