//! ASO metadata management for pabal.
//!
//! This crate provides the data model for App Store and Google Play listing
//! metadata, the per-product JSON cache kept under the data directory, and
//! helpers for mirroring screenshots to local files.

pub mod assets;
pub mod error;
pub mod storage;
pub mod types;
pub mod utils;

pub use assets::{AssetDownloader, DownloadSummary};
pub use error::MetadataError;
pub use storage::{AsoStorage, DataKind};
pub use types::apple::AppStoreLocaleData;
pub use types::aso::AsoData;
pub use types::common::{LocaleEntry, LocalizedSet, Multilingual, Store};
pub use types::google_play::{GooglePlayLocaleData, GooglePlayScreenshots};
pub use types::release_notes::ReleaseNote;

/// Result type alias for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;
