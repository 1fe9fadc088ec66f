//! Pabal Core - configuration, app registry and ASO workflows
//!
//! This crate ties the store clients from `pabal-stores` and the local ASO
//! cache from `pabal-metadata` together. Tool front ends build a
//! [`ServiceContext`] once and call into [`workflow`] for every request.

pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod workflow;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{load_config, ConfigOverrides, PabalConfig};
pub use context::ServiceContext;
pub use error::{ConfigError, ErrorKind, PabalError, RegistryError, Result};
pub use registry::{AppStoreEntry, GooglePlayEntry, RegisteredApp, RegisteredAppsStore};
