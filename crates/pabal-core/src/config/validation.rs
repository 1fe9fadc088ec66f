//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::ConfigFile;

/// Validate a parsed credentials file
pub fn validate_config(config: &ConfigFile) -> Result<()> {
    debug!("validating configuration");
    validate_app_store(config)?;
    validate_google_play(config)?;
    validate_product_page(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_app_store(config: &ConfigFile) -> Result<()> {
    let Some(app_store) = &config.app_store else {
        return Ok(());
    };

    for (field, value) in [
        ("appStore.issuerId", app_store.issuer_id.trim()),
        ("appStore.keyId", app_store.key_id.trim()),
    ] {
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "cannot be empty".to_string(),
            }
            .into());
        }
    }

    if app_store.private_key_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "appStore.privateKeyPath".to_string(),
            message: "cannot be empty".to_string(),
        }
        .into());
    }

    Ok(())
}

fn validate_google_play(config: &ConfigFile) -> Result<()> {
    if let Some(google_play) = &config.google_play {
        if google_play.service_account_key_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "googlePlay.serviceAccountKeyPath".to_string(),
                message: "cannot be empty".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_product_page(config: &ConfigFile) -> Result<()> {
    if let Some(url) = &config.product_page_base_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "productPageBaseUrl".to_string(),
                message: "must be an http(s) URL".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{AppStoreSection, GooglePlaySection};
    use std::path::PathBuf;

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&ConfigFile::default()).is_ok());
    }

    #[test]
    fn test_empty_key_id_rejected() {
        let config = ConfigFile {
            app_store: Some(AppStoreSection {
                issuer_id: "iss".to_string(),
                key_id: " ".to_string(),
                private_key_path: PathBuf::from("key.p8"),
            }),
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("appStore.keyId"));
    }

    #[test]
    fn test_empty_service_account_rejected() {
        let config = ConfigFile {
            google_play: Some(GooglePlaySection {
                service_account_key_path: PathBuf::new(),
            }),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_product_page_must_be_http() {
        let config = ConfigFile {
            product_page_base_url: Some("example.com".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
