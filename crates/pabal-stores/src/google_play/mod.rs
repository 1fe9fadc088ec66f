//! Google Play Store integration
//!
//! ## Authentication
//!
//! Uses a Google Cloud service account with Google Play Developer API access.
//! The service account signs an RS256 assertion that is exchanged for an
//! OAuth access token.

mod client;
pub mod models;

pub use client::GooglePlayClient;
