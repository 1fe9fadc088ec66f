//! Credential checks

use pabal_metadata::Store;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};

use super::StoreSelection;

/// Result of checking one store's credentials
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCheckResult {
    pub store: Store,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl AuthCheckResult {
    fn failed(store: Store, error: &PabalError) -> Self {
        Self {
            store,
            ok: false,
            account: None,
            detail: error.to_string(),
            error_kind: Some(error.kind().to_string()),
        }
    }
}

/// Check a single store's credentials against its API
pub async fn check_store_auth(ctx: &ServiceContext, store: Store) -> AuthCheckResult {
    let status: Result<_> = match store {
        Store::AppStore => match ctx.app_store() {
            Ok(client) => client.check_auth().await.map_err(PabalError::from),
            Err(e) => Err(e),
        },
        Store::GooglePlay => match ctx.google_play() {
            Ok(client) => client.check_auth().await.map_err(PabalError::from),
            Err(e) => Err(e),
        },
    };

    match status {
        Ok(status) => {
            info!(store = %store, account = %status.account, "credentials valid");
            AuthCheckResult {
                store,
                ok: true,
                account: Some(status.account),
                detail: status.detail,
                error_kind: None,
            }
        }
        Err(e) => {
            warn!(store = %store, error = %e, "credential check failed");
            AuthCheckResult::failed(store, &e)
        }
    }
}

/// Check every selected store
pub async fn check_auth(ctx: &ServiceContext, selection: StoreSelection) -> Vec<AuthCheckResult> {
    let mut results = Vec::new();
    for store in selection.stores() {
        results.push(check_store_auth(ctx, store).await);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PabalConfig;
    use crate::testing::{MockAppStore, MockGooglePlay};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_check_both_stores() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::new(
            PabalConfig::empty(temp.path()),
            Some(Arc::new(
                MockAppStore::default().with_auth_error("401 for issuer iss"),
            )),
            Some(Arc::new(MockGooglePlay::default())),
        );

        let results = check_auth(&ctx, StoreSelection::Both).await;
        assert_eq!(results.len(), 2);

        assert!(!results[0].ok);
        assert_eq!(results[0].error_kind.as_deref(), Some("Configuration"));
        assert!(results[0].detail.contains("401 for issuer iss"));

        assert!(results[1].ok);
        assert_eq!(
            results[1].account.as_deref(),
            Some("ci@demo-project.iam.gserviceaccount.com")
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_reported() {
        let temp = TempDir::new().unwrap();
        let ctx = ServiceContext::new(PabalConfig::empty(temp.path()), None, None);

        let result = check_store_auth(&ctx, Store::GooglePlay).await;
        assert!(!result.ok);
        assert_eq!(
            result.detail,
            "Google Play credentials are not configured"
        );
    }
}
