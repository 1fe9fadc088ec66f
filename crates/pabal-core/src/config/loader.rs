//! Configuration loading

use std::path::{Path, PathBuf};

use pabal_stores::{AppStoreConfig, GooglePlayConfig};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::{user_config_path, DATA_DIR_ENV, PROJECT_CONFIG_FILE};
use super::types::{ConfigFile, ConfigOverrides, PabalConfig};
use super::validation::validate_config;

/// Read and validate a credentials file
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    info!(path = %path.display(), "loading config");

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ConfigFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find the credentials file.
///
/// An explicit path must exist. Otherwise the search checks:
///   1. `<cwd>/secrets/aso-config.json`
///   2. `<user config dir>/pabal-mcp/config.json`
pub fn find_config(
    explicit: Option<&Path>,
    cwd: &Path,
    user_config: Option<&Path>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        let path = absolutize(path, cwd);
        if !path.is_file() {
            return Err(ConfigError::NotFound(path).into());
        }
        return Ok(Some(path));
    }

    let project = cwd.join(PROJECT_CONFIG_FILE);
    if project.is_file() {
        info!(path = %project.display(), "found project config file");
        return Ok(Some(project));
    }

    if let Some(user) = user_config.filter(|p| p.is_file()) {
        info!(path = %user.display(), "found user config file");
        return Ok(Some(user.to_path_buf()));
    }

    debug!(cwd = %cwd.display(), "no config file found");
    Ok(None)
}

/// Turn a parsed file into runtime configuration.
///
/// Relative paths in the file resolve against the file's directory. The data
/// directory is taken from the override, then the file, then `env_data_dir`,
/// then `cwd`.
pub fn resolve_config(
    file: ConfigFile,
    source: Option<&Path>,
    overrides: &ConfigOverrides,
    cwd: &Path,
    env_data_dir: Option<PathBuf>,
) -> PabalConfig {
    let base = source
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.to_path_buf());

    let app_store = file.app_store.map(|section| AppStoreConfig {
        issuer_id: section.issuer_id.trim().to_string(),
        key_id: section.key_id.trim().to_string(),
        private_key_path: absolutize(&section.private_key_path, &base),
    });

    let google_play = file.google_play.map(|section| GooglePlayConfig {
        service_account_key_path: absolutize(&section.service_account_key_path, &base),
    });

    let data_dir = if let Some(dir) = &overrides.data_dir {
        absolutize(dir, cwd)
    } else if let Some(dir) = &file.data_dir {
        absolutize(dir, &base)
    } else if let Some(dir) = env_data_dir.filter(|d| !d.as_os_str().is_empty()) {
        absolutize(&dir, cwd)
    } else {
        cwd.to_path_buf()
    };

    PabalConfig {
        app_store,
        google_play,
        data_dir,
        product_page_base_url: file
            .product_page_base_url
            .map(|url| url.trim_end_matches('/').to_string()),
        source: source.map(Path::to_path_buf),
    }
}

/// Load configuration from the process environment.
///
/// A missing config file is not an error: the server starts without
/// credentials and store tools report a configuration error when called.
pub fn load_config(overrides: &ConfigOverrides) -> Result<PabalConfig> {
    let cwd = std::env::current_dir()?;
    let user_config = user_config_path();
    let env_data_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);

    let source = find_config(overrides.config_path.as_deref(), &cwd, user_config.as_deref())?;
    let file = match &source {
        Some(path) => read_config_file(path)?,
        None => {
            warn!(cwd = %cwd.display(), "no config file found, store credentials unavailable");
            ConfigFile::default()
        }
    };

    let config = resolve_config(file, source.as_deref(), overrides, &cwd, env_data_dir);
    info!(
        data_dir = %config.data_dir.display(),
        app_store = config.app_store.is_some(),
        google_play = config.google_play.is_some(),
        "configuration resolved"
    );
    Ok(config)
}

fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PabalError;
    use tempfile::TempDir;

    fn write_config(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_project_config() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "secrets/aso-config.json", "{}");

        let found = find_config(None, temp.path(), None).unwrap();
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_project_config_preferred_over_user_config() {
        let temp = TempDir::new().unwrap();
        let project = write_config(temp.path(), "secrets/aso-config.json", "{}");
        let user = write_config(temp.path(), "user/pabal-mcp/config.json", "{}");

        let found = find_config(None, temp.path(), Some(&user)).unwrap();
        assert_eq!(found, Some(project));
    }

    #[test]
    fn test_user_config_fallback() {
        let temp = TempDir::new().unwrap();
        let user = write_config(temp.path(), "user/pabal-mcp/config.json", "{}");

        let found = find_config(None, temp.path(), Some(&user)).unwrap();
        assert_eq!(found, Some(user));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let err = find_config(Some(Path::new("nope.json")), temp.path(), None).unwrap_err();
        assert!(matches!(err, PabalError::Config(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        assert_eq!(find_config(None, temp.path(), None).unwrap(), None);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "config.json", "{ not json");
        let err = read_config_file(&path).unwrap_err();
        assert!(matches!(
            err,
            PabalError::Config(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            "secrets/aso-config.json",
            r#"{
                "appStore": {"issuerId": "iss", "keyId": "KEY", "privateKeyPath": "AuthKey.p8"},
                "googlePlay": {"serviceAccountKeyPath": "/abs/sa.json"},
                "dataDir": "../data"
            }"#,
        );

        let file = read_config_file(&path).unwrap();
        let config = resolve_config(
            file,
            Some(&path),
            &ConfigOverrides::default(),
            temp.path(),
            None,
        );

        let secrets = temp.path().join("secrets");
        assert_eq!(
            config.app_store.unwrap().private_key_path,
            secrets.join("AuthKey.p8")
        );
        assert_eq!(
            config.google_play.unwrap().service_account_key_path,
            PathBuf::from("/abs/sa.json")
        );
        assert_eq!(config.data_dir, secrets.join("../data"));
        assert_eq!(config.source, Some(path));
    }

    #[test]
    fn test_data_dir_precedence() {
        let temp = TempDir::new().unwrap();
        let cwd = temp.path();
        let file = ConfigFile {
            data_dir: Some(PathBuf::from("/from-file")),
            ..Default::default()
        };

        let overrides = ConfigOverrides {
            config_path: None,
            data_dir: Some(PathBuf::from("/from-flag")),
        };
        let config = resolve_config(file.clone(), None, &overrides, cwd, Some("/env".into()));
        assert_eq!(config.data_dir, PathBuf::from("/from-flag"));

        let config = resolve_config(
            file,
            None,
            &ConfigOverrides::default(),
            cwd,
            Some("/env".into()),
        );
        assert_eq!(config.data_dir, PathBuf::from("/from-file"));

        let config = resolve_config(
            ConfigFile::default(),
            None,
            &ConfigOverrides::default(),
            cwd,
            Some("/env".into()),
        );
        assert_eq!(config.data_dir, PathBuf::from("/env"));

        let config = resolve_config(
            ConfigFile::default(),
            None,
            &ConfigOverrides::default(),
            cwd,
            None,
        );
        assert_eq!(config.data_dir, cwd.to_path_buf());
    }
}
