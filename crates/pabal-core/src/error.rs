//! Error types for pabal

use pabal_metadata::{MetadataError, Store};
use pabal_stores::StoreError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using PabalError
pub type Result<T> = std::result::Result<T, PabalError>;

/// Main error type for pabal operations
#[derive(Debug, Error)]
pub enum PabalError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Registered-apps store errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Store API errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Local ASO cache errors
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Invalid tool input
    #[error("{0}")]
    Validation(String),

    /// Missing app, data or version
    #[error("{0}")]
    NotFound(String),

    /// Operation conflicts with existing state
    #[error("{0}")]
    Conflict(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicitly requested configuration file does not exist
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// No credentials for a store
    #[error("{0} credentials are not configured")]
    StoreNotConfigured(Store),

    /// Credentials present but the client could not be built
    #[error("{store} client could not be initialized: {message}")]
    ClientInit { store: Store, message: String },

    /// IO error
    #[error("IO error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Registered-apps store errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry file could not be read or written
    #[error("IO error on registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry file is not valid JSON
    #[error("Failed to parse registry {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Slug already registered
    #[error("An app with slug '{0}' is already registered")]
    DuplicateSlug(String),

    /// No app matches the identifier
    #[error("No registered app matches '{0}'")]
    AppNotFound(String),

    /// App exists but is not registered for the store
    #[error("App '{identifier}' is not registered for {store}")]
    StoreNotRegistered { identifier: String, store: Store },

    /// App record is incomplete
    #[error("Invalid app: {0}")]
    InvalidApp(String),
}

/// Closed set of error categories reported to tool callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Conflict,
    Upstream,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration"),
            ErrorKind::Validation => write!(f, "Validation"),
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::Upstream => write!(f, "Upstream"),
        }
    }
}

impl PabalError {
    /// Category of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PabalError::Config(_) => ErrorKind::Configuration,
            PabalError::Registry(err) => match err {
                RegistryError::Io { .. } | RegistryError::Parse { .. } => {
                    ErrorKind::Configuration
                }
                RegistryError::DuplicateSlug(_) => ErrorKind::Conflict,
                RegistryError::AppNotFound(_) | RegistryError::StoreNotRegistered { .. } => {
                    ErrorKind::NotFound
                }
                RegistryError::InvalidApp(_) => ErrorKind::Validation,
            },
            PabalError::Store(err) => match err {
                StoreError::AuthenticationFailed(_)
                | StoreError::InvalidCredentials(_)
                | StoreError::ConfigurationError(_) => ErrorKind::Configuration,
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::StateConflict { .. } => ErrorKind::Conflict,
                StoreError::InvalidInput(_) => ErrorKind::Validation,
                StoreError::ApiError { .. }
                | StoreError::Io(_)
                | StoreError::Http(_)
                | StoreError::Json(_)
                | StoreError::Jwt(_) => ErrorKind::Upstream,
            },
            PabalError::Metadata(err) => match err {
                MetadataError::NotFound(_) => ErrorKind::NotFound,
                MetadataError::InvalidFormat(_) | MetadataError::SerializationError(_) => {
                    ErrorKind::Validation
                }
                MetadataError::Download { .. } => ErrorKind::Upstream,
                MetadataError::Io(_) | MetadataError::File { .. } => ErrorKind::Configuration,
            },
            PabalError::Validation(_) => ErrorKind::Validation,
            PabalError::NotFound(_) => ErrorKind::NotFound,
            PabalError::Conflict(_) => ErrorKind::Conflict,
            PabalError::Io(_) => ErrorKind::Configuration,
        }
    }

    /// `"<Kind> error: <message>"` as shown to tool callers.
    pub fn user_message(&self) -> String {
        format!("{} error: {}", self.kind(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_kinds() {
        let err: PabalError = StoreError::from_response(409, "STATE_ERROR".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: PabalError = StoreError::from_response(500, "boom".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Upstream);

        let err: PabalError = StoreError::AuthenticationFailed("bad key".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_registry_error_kinds() {
        let err: PabalError = RegistryError::DuplicateSlug("demo".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.user_message(),
            "Conflict error: An app with slug 'demo' is already registered"
        );

        let err: PabalError = RegistryError::AppNotFound("x".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_metadata_error_kinds() {
        let err: PabalError = MetadataError::NotFound("no data".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "NotFound error: Not found: no data");
    }

    #[test]
    fn test_config_error_message() {
        let err: PabalError = ConfigError::StoreNotConfigured(Store::GooglePlay).into();
        assert_eq!(
            err.user_message(),
            "Configuration error: Google Play credentials are not configured"
        );
    }
}
