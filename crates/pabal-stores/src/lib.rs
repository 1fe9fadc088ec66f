//! Store API clients for pabal
//!
//! This crate wraps the two store APIs pabal manages listings through:
//!
//! - **App Store Connect**: ES256 JWT bearer auth, JSON:API resources with
//!   `links.next` pagination.
//! - **Google Play Android Publisher**: service-account OAuth and edit
//!   sessions.
//!
//! Both clients are exposed behind the [`AppStoreApi`] and [`GooglePlayApi`]
//! traits so callers can substitute mocks.
//!
//! ## Usage
//!
//! ```ignore
//! use pabal_stores::{AppStoreApi, AppStoreConfig, apple::AppStoreConnectClient};
//!
//! let client = AppStoreConnectClient::new(config)?;
//! let app = client.find_app("com.example.app").await?;
//! ```

pub mod auth;
pub mod error;
pub mod traits;
pub mod types;
pub mod version;

pub mod apple;
pub mod google_play;

pub use error::StoreError;
pub use traits::{AppStoreApi, GooglePlayApi};
pub use types::*;
pub use version::{compare_versions, increment_version, sort_versions};
