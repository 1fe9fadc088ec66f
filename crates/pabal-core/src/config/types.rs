//! Configuration types

use pabal_stores::{AppStoreConfig, GooglePlayConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Credentials file as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// App Store Connect API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<AppStoreSection>,

    /// Google Play service account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_play: Option<GooglePlaySection>,

    /// Directory holding `.aso/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the product pages, `<base>/<slug>` is pushed as marketing URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_page_base_url: Option<String>,
}

/// `appStore` section of the credentials file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreSection {
    pub issuer_id: String,
    pub key_id: String,
    pub private_key_path: PathBuf,
}

/// `googlePlay` section of the credentials file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GooglePlaySection {
    pub service_account_key_path: PathBuf,
}

/// Command line overrides applied on top of the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file (`--config` / `PABAL_MCP_CONFIG`)
    pub config_path: Option<PathBuf>,

    /// Explicit data directory (`--data-dir`)
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PabalConfig {
    pub app_store: Option<AppStoreConfig>,
    pub google_play: Option<GooglePlayConfig>,
    pub data_dir: PathBuf,
    pub product_page_base_url: Option<String>,
    /// File the configuration was read from
    pub source: Option<PathBuf>,
}

impl PabalConfig {
    /// Configuration without credentials rooted at `data_dir`
    pub fn empty(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_store: None,
            google_play: None,
            data_dir: data_dir.into(),
            product_page_base_url: None,
            source: None,
        }
    }

    /// `<productPageBaseUrl>/<slug>` when a base URL is configured
    pub fn product_page_url(&self, slug: &str) -> Option<String> {
        self.product_page_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_camel_case() {
        let json = r#"{
            "appStore": {"issuerId": "iss", "keyId": "KEY", "privateKeyPath": "AuthKey.p8"},
            "productPageBaseUrl": "https://example.com/apps"
        }"#;
        let file: ConfigFile = serde_json::from_str(json).unwrap();
        let app_store = file.app_store.unwrap();
        assert_eq!(app_store.key_id, "KEY");
        assert_eq!(app_store.private_key_path, PathBuf::from("AuthKey.p8"));
        assert!(file.google_play.is_none());
    }

    #[test]
    fn test_product_page_url() {
        let mut config = PabalConfig::empty("/tmp");
        assert_eq!(config.product_page_url("demo"), None);

        config.product_page_base_url = Some("https://example.com/apps/".to_string());
        assert_eq!(
            config.product_page_url("demo").as_deref(),
            Some("https://example.com/apps/demo")
        );
    }
}
