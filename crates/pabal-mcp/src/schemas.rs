//! MCP tool parameter schemas
//!
//! Field names are camelCase on the wire. All structs derive `Debug`,
//! `Deserialize` and `JsonSchema` as rmcp requires.

use std::collections::BTreeMap;

use pabal_core::workflow::StoreSelection;
use schemars::JsonSchema;
use serde::Deserialize;

/// Store filter accepted by most tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum StoreArg {
    AppStore,
    GooglePlay,
    #[default]
    Both,
}

impl From<StoreArg> for StoreSelection {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::AppStore => StoreSelection::AppStore,
            StoreArg::GooglePlay => StoreSelection::GooglePlay,
            StoreArg::Both => StoreSelection::Both,
        }
    }
}

/// Parameters for tools that take no input.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct EmptyParams {}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAppParams {
    #[schemars(description = "App Store bundle ID or Google Play package name")]
    pub identifier: String,

    #[schemars(description = "Short unique name for the app (defaults to the last identifier segment)")]
    pub slug: Option<String>,

    #[schemars(description = "Display name (defaults to the name found on the stores)")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchAppsParams {
    #[schemars(description = "Matches slug, name, bundle ID or package name; all apps when omitted")]
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckParams {
    #[schemars(description = "Store to check: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store to pull from: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,

    #[schemars(description = "Also download screenshots into the local cache")]
    #[serde(default)]
    pub download_screenshots: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrepareParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Replace existing push data")]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store to push to: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,

    #[schemars(description = "Report what would be pushed without calling the stores")]
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PullReleaseNotesParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store to read from: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReleaseNotesParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store to update: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,

    #[schemars(description = "Release notes in sourceLocale")]
    pub text: Option<String>,

    #[schemars(description = "Locale of text (default en-US)")]
    pub source_locale: Option<String>,

    #[schemars(description = "Release notes gathered so far, keyed by locale")]
    #[serde(default)]
    pub notes: BTreeMap<String, String>,

    #[schemars(description = "App Store version to update (latest when omitted)")]
    pub version_string: Option<String>,

    #[schemars(description = "Google Play track (default production)")]
    pub track: Option<String>,

    #[schemars(description = "Google Play version code of the release to update (newest on the track when omitted)")]
    pub version_code: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWhatsNewParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "What's new text in sourceLocale")]
    pub text: Option<String>,

    #[schemars(description = "Locale of text (default en-US)")]
    pub source_locale: Option<String>,

    #[schemars(description = "What's new texts gathered so far, keyed by locale")]
    #[serde(default)]
    pub notes: BTreeMap<String, String>,

    #[schemars(description = "App Store version to update (latest when omitted)")]
    pub version_string: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckVersionsParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store to check: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionParams {
    #[schemars(description = "Registered app slug, bundle ID or package name")]
    pub app: String,

    #[schemars(description = "Store: appStore, googlePlay or both (default)")]
    #[serde(default)]
    pub store: StoreArg,

    #[schemars(description = "Version string (latest App Store version bumped when omitted)")]
    pub version_string: Option<String>,

    #[schemars(description = "Uploaded Google Play version codes for a draft release")]
    #[serde(default)]
    pub version_codes: Vec<String>,

    #[schemars(description = "Google Play track (default production)")]
    pub track: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_use_camel_case() {
        let params: PushParams =
            serde_json::from_str(r#"{"app": "notes", "store": "googlePlay", "dryRun": true}"#)
                .unwrap();
        assert_eq!(params.store, StoreArg::GooglePlay);
        assert!(params.dry_run);

        let params: PullParams = serde_json::from_str(r#"{"app": "notes"}"#).unwrap();
        assert_eq!(params.store, StoreArg::Both);
        assert!(!params.download_screenshots);
    }

    #[test]
    fn test_store_arg_conversion() {
        assert_eq!(
            StoreSelection::from(StoreArg::AppStore),
            StoreSelection::AppStore
        );
        assert_eq!(StoreSelection::from(StoreArg::default()), StoreSelection::Both);
    }
}
