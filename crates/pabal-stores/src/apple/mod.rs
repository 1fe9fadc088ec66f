//! Apple App Store Connect integration

mod client;
pub mod models;

pub use client::AppStoreConnectClient;
