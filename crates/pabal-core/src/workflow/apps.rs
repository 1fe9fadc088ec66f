//! App registration

use pabal_metadata::storage::validate_slug;
use pabal_metadata::Store;
use pabal_stores::{AppStoreApp, GooglePlayApp};
use tracing::{debug, info, warn};

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};
use crate::registry::{AppStoreEntry, GooglePlayEntry, RegisteredApp};

/// Options for registering an app
#[derive(Debug, Clone, Default)]
pub struct AddAppOptions {
    /// Bundle ID or package name
    pub identifier: String,
    /// Slug to register under; defaults to the identifier's last segment
    pub slug: Option<String>,
    /// Display name; defaults to the store name
    pub name: Option<String>,
}

/// Outcome of a lookup on one store
enum Lookup<T> {
    Found(T),
    Missing,
    Unavailable(PabalError),
    Failed(PabalError),
}

/// Look the identifier up on both stores and register what was found
pub async fn add_app(ctx: &ServiceContext, options: AddAppOptions) -> Result<RegisteredApp> {
    let identifier = options.identifier.trim();
    if identifier.is_empty() {
        return Err(PabalError::Validation("identifier cannot be empty".to_string()));
    }

    if let Some(existing) = ctx.registry().find(identifier)? {
        return Err(PabalError::Conflict(format!(
            "'{}' is already registered as '{}'",
            identifier, existing.slug
        )));
    }

    let app_store = lookup_app_store(ctx, identifier).await;
    let google_play = lookup_google_play(ctx, identifier).await;

    let (app_store, google_play) = match (app_store, google_play) {
        (Lookup::Found(a), Lookup::Found(g)) => (Some(a), Some(g)),
        (Lookup::Found(a), _) => (Some(a), None),
        (_, Lookup::Found(g)) => (None, Some(g)),
        (Lookup::Failed(e), _) | (_, Lookup::Failed(e)) => return Err(e),
        (Lookup::Unavailable(e), Lookup::Unavailable(_)) => return Err(e),
        _ => {
            return Err(PabalError::NotFound(format!(
                "'{}' was not found on App Store Connect or Google Play",
                identifier
            )))
        }
    };

    let slug = match options.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => default_slug(identifier),
    };
    validate_slug(&slug)?;

    let name = options
        .name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| app_store.as_ref().map(|(app, _)| app.name.clone()))
        .or_else(|| google_play.as_ref().and_then(|(app, _)| app.title.clone()))
        .unwrap_or_else(|| slug.clone());

    let app = RegisteredApp {
        slug,
        name,
        app_store: app_store.map(|(app, locales)| AppStoreEntry {
            bundle_id: app.bundle_id,
            app_id: Some(app.id),
            name: Some(app.name),
            supported_locales: locales,
        }),
        google_play: google_play.map(|(app, locales)| GooglePlayEntry {
            package_name: app.package_name,
            name: app.title,
            supported_locales: locales,
        }),
    };

    let app = ctx.registry().register(app)?;
    info!(
        slug = %app.slug,
        app_store = app.has_store(Store::AppStore),
        google_play = app.has_store(Store::GooglePlay),
        "app added"
    );
    Ok(app)
}

/// Search registered apps; no query lists every app
pub fn search_apps(ctx: &ServiceContext, query: Option<&str>) -> Result<Vec<RegisteredApp>> {
    ctx.registry().search(query)
}

async fn lookup_app_store(
    ctx: &ServiceContext,
    bundle_id: &str,
) -> Lookup<(AppStoreApp, Option<Vec<String>>)> {
    let client = match ctx.app_store() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "skipping App Store lookup");
            return Lookup::Unavailable(e);
        }
    };

    match client.find_app(bundle_id).await {
        Ok(Some(app)) => {
            let locales = match client.supported_locales(&app.id).await {
                Ok(locales) => Some(locales),
                Err(e) => {
                    warn!(app_id = %app.id, error = %e, "could not fetch App Store locales");
                    None
                }
            };
            Lookup::Found((app, locales))
        }
        Ok(None) => Lookup::Missing,
        Err(e) if e.is_not_found() => Lookup::Missing,
        Err(e) => Lookup::Failed(e.into()),
    }
}

async fn lookup_google_play(
    ctx: &ServiceContext,
    package_name: &str,
) -> Lookup<(GooglePlayApp, Option<Vec<String>>)> {
    let client = match ctx.google_play() {
        Ok(client) => client,
        Err(e) => {
            debug!(error = %e, "skipping Google Play lookup");
            return Lookup::Unavailable(e);
        }
    };

    match client.find_app(package_name).await {
        Ok(Some(app)) => {
            let locales = match client.supported_locales(package_name).await {
                Ok(locales) => Some(locales),
                Err(e) => {
                    warn!(package_name = %package_name, error = %e, "could not fetch Google Play locales");
                    None
                }
            };
            Lookup::Found((app, locales))
        }
        Ok(None) => Lookup::Missing,
        Err(e) if e.is_not_found() => Lookup::Missing,
        Err(e) => Lookup::Failed(e.into()),
    }
}

fn default_slug(identifier: &str) -> String {
    identifier
        .rsplit('.')
        .find(|segment| !segment.is_empty())
        .unwrap_or(identifier)
        .to_lowercase()
}
