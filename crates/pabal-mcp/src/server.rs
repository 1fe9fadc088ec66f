//! MCP server exposing the ASO workflows as tools.
//!
//! Workflow failures never surface as protocol errors: they come back as an
//! error tool result whose text is `"<Kind> error: <message>"`. Only output
//! serialization problems map to an internal `McpError`.

use std::sync::Arc;

use pabal_core::workflow::{
    self, AddAppOptions, CreateVersionOptions, PrepareOptions, PullOptions, PushOptions,
    ReleaseNotesOutcome, ReleaseNotesRequest, StoreSelection,
};
use pabal_core::{PabalError, ServiceContext};
use pabal_metadata::Store;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use tracing::{debug, error, warn};

use crate::format;
use crate::schemas::{
    AddAppParams, AuthCheckParams, CheckVersionsParams, CreateVersionParams, EmptyParams,
    PrepareParams, PullParams, PullReleaseNotesParams, PushParams, SearchAppsParams,
    UpdateReleaseNotesParams, UpdateWhatsNewParams,
};

/// Error result carrying the user-facing message of a workflow failure
fn tool_failure(action: &str, error: &PabalError) -> CallToolResult {
    warn!(action, kind = %error.kind(), error = %error, "tool call failed");
    CallToolResult::error(vec![Content::text(error.user_message())])
}

fn internal_error(error: impl std::fmt::Display, context: &str) -> McpError {
    error!("{context} error: {error}");
    McpError::internal_error(
        format!("{context} failed - check server logs for details"),
        None,
    )
}

/// Summary text followed by a `{"_meta": ...}` block
fn with_meta<T: serde::Serialize>(
    text: String,
    meta: &T,
    context: &str,
) -> Result<CallToolResult, McpError> {
    let meta = format::meta_text(meta).map_err(|e| internal_error(e, context))?;
    Ok(CallToolResult::success(vec![
        Content::text(text),
        Content::text(meta),
    ]))
}

#[derive(Clone)]
pub struct PabalMcp {
    ctx: Arc<ServiceContext>,
    tool_router: ToolRouter<Self>,
}

impl PabalMcp {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    async fn auth_result(&self, selection: StoreSelection) -> CallToolResult {
        let results = workflow::check_auth(&self.ctx, selection).await;
        let text = format::auth(&results);
        if results.iter().all(|result| result.ok) {
            CallToolResult::success(vec![Content::text(text)])
        } else {
            CallToolResult::error(vec![Content::text(text)])
        }
    }

    async fn release_notes_result(
        &self,
        action: &str,
        request: ReleaseNotesRequest,
        whats_new: bool,
    ) -> Result<CallToolResult, McpError> {
        let app = request.app.clone();
        let outcome = if whats_new {
            workflow::update_whats_new(&self.ctx, request).await
        } else {
            workflow::update_release_notes(&self.ctx, request).await
        };

        match outcome {
            Ok(ReleaseNotesOutcome::NeedsTranslation(translation)) => {
                debug!(app = %app, missing = ?translation.missing_locales, "asking for translations");
                with_meta(
                    format::translation_request(&app, &translation),
                    &translation,
                    action,
                )
            }
            Ok(ReleaseNotesOutcome::Updated(report)) => Ok(CallToolResult::success(vec![
                Content::text(format::release_notes(&report)),
            ])),
            Err(e) => Ok(tool_failure(action, &e)),
        }
    }
}

#[tool_router]
impl PabalMcp {
    #[tool(name = "ping", description = "Check that the pabal-mcp server is running")]
    async fn ping(&self, _params: Parameters<EmptyParams>) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text("pong")]))
    }

    #[tool(
        name = "apps-add",
        description = "Register an app by App Store bundle ID or Google Play package name. Looks the identifier up on both stores and records the app ID, names and supported locales."
    )]
    async fn apps_add(
        &self,
        Parameters(params): Parameters<AddAppParams>,
    ) -> Result<CallToolResult, McpError> {
        let options = AddAppOptions {
            identifier: params.identifier,
            slug: params.slug,
            name: params.name,
        };
        match workflow::add_app(&self.ctx, options).await {
            Ok(app) => Ok(CallToolResult::success(vec![Content::text(
                format::registered(&app),
            )])),
            Err(e) => Ok(tool_failure("apps-add", &e)),
        }
    }

    #[tool(
        name = "apps-search",
        description = "List registered apps, optionally filtered by slug, name, bundle ID or package name"
    )]
    async fn apps_search(
        &self,
        Parameters(params): Parameters<SearchAppsParams>,
    ) -> Result<CallToolResult, McpError> {
        let query = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        match workflow::search_apps(&self.ctx, query) {
            Ok(apps) => Ok(CallToolResult::success(vec![Content::text(format::apps(
                &apps, query,
            ))])),
            Err(e) => Ok(tool_failure("apps-search", &e)),
        }
    }

    #[tool(
        name = "auth-check",
        description = "Verify App Store Connect and Google Play credentials"
    )]
    async fn auth_check(
        &self,
        Parameters(params): Parameters<AuthCheckParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.auth_result(params.store.into()).await)
    }

    #[tool(
        name = "auth-check-app-store",
        description = "Verify App Store Connect API key credentials"
    )]
    async fn auth_check_app_store(
        &self,
        _params: Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.auth_result(StoreSelection::AppStore).await)
    }

    #[tool(
        name = "auth-check-google-play",
        description = "Verify Google Play service account credentials"
    )]
    async fn auth_check_google_play(
        &self,
        _params: Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.auth_result(StoreSelection::GooglePlay).await)
    }

    #[tool(
        name = "aso-pull",
        description = "Pull every localized store listing of a registered app into the local pullData cache, optionally downloading screenshots"
    )]
    async fn aso_pull(
        &self,
        Parameters(params): Parameters<PullParams>,
    ) -> Result<CallToolResult, McpError> {
        let options = PullOptions {
            app: params.app,
            stores: params.store.into(),
            download_screenshots: params.download_screenshots,
        };
        match workflow::pull(&self.ctx, options).await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(format::pull(
                &report,
            ))])),
            Err(e) => Ok(tool_failure("aso-pull", &e)),
        }
    }

    #[tool(
        name = "aso-prepare",
        description = "Copy pulled data into pushData, the editable working copy aso-push reads"
    )]
    async fn aso_prepare(
        &self,
        Parameters(params): Parameters<PrepareParams>,
    ) -> Result<CallToolResult, McpError> {
        let options = PrepareOptions {
            app: params.app,
            overwrite: params.overwrite,
        };
        match workflow::prepare(&self.ctx, options).await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(
                format::prepare(&report),
            )])),
            Err(e) => Ok(tool_failure("aso-prepare", &e)),
        }
    }

    #[tool(
        name = "aso-push",
        description = "Push local ASO data (pushData, else pullData) to the stores. Screenshots are not uploaded. When the App Store version is locked a new version is created and what's new text is requested."
    )]
    async fn aso_push(
        &self,
        Parameters(params): Parameters<PushParams>,
    ) -> Result<CallToolResult, McpError> {
        let options = PushOptions {
            app: params.app,
            stores: params.store.into(),
            dry_run: params.dry_run,
        };
        let report = match workflow::push(&self.ctx, options).await {
            Ok(report) => report,
            Err(e) => return Ok(tool_failure("aso-push", &e)),
        };

        let text = format::push(&report);
        if let Some(result) = report.app_store.as_ref().filter(|r| r.needs_new_version) {
            return with_meta(
                text,
                &serde_json::json!({
                    "needsNewVersion": true,
                    "newVersion": result.new_version,
                    "needsWhatsNewTranslation": result.needs_whats_new_translation,
                    "whatsNewLocales": result.whats_new_locales,
                }),
                "aso-push",
            );
        }

        if report.app_store.is_none() && report.google_play.is_none() && !report.dry_run {
            return Ok(CallToolResult::error(vec![Content::text(text)]));
        }
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        name = "aso-pull-release-notes",
        description = "Fetch current release notes (App Store what's new of the latest version, Google Play production release notes) and save them locally"
    )]
    async fn aso_pull_release_notes(
        &self,
        Parameters(params): Parameters<PullReleaseNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        match workflow::pull_release_notes(&self.ctx, &params.app, params.store.into()).await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(
                format::pulled_release_notes(&report),
            )])),
            Err(e) => Ok(tool_failure("aso-pull-release-notes", &e)),
        }
    }

    #[tool(
        name = "release-update-notes",
        description = "Update release notes on the stores. Pass text with sourceLocale, or notes keyed by locale. When supported locales are missing a translation request is returned; translate and call again with every locale in notes."
    )]
    async fn release_update_notes(
        &self,
        Parameters(params): Parameters<UpdateReleaseNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = ReleaseNotesRequest {
            app: params.app,
            stores: params.store.into(),
            text: params.text,
            source_locale: params.source_locale,
            notes: params.notes,
            version_string: params.version_string,
            track: params.track,
            version_code: params.version_code,
        };
        self.release_notes_result("release-update-notes", request, false)
            .await
    }

    #[tool(
        name = "aso-update-whats-new",
        description = "Update App Store what's new text of a version. Works like release-update-notes for the App Store only."
    )]
    async fn aso_update_whats_new(
        &self,
        Parameters(params): Parameters<UpdateWhatsNewParams>,
    ) -> Result<CallToolResult, McpError> {
        let request = ReleaseNotesRequest {
            app: params.app,
            stores: StoreSelection::AppStore,
            text: params.text,
            source_locale: params.source_locale,
            notes: params.notes,
            version_string: params.version_string,
            ..Default::default()
        };
        self.release_notes_result("aso-update-whats-new", request, true)
            .await
    }

    #[tool(
        name = "release-check-versions",
        description = "Show the latest App Store version and the newest Google Play release of every track"
    )]
    async fn release_check_versions(
        &self,
        Parameters(params): Parameters<CheckVersionsParams>,
    ) -> Result<CallToolResult, McpError> {
        match workflow::check_versions(&self.ctx, &params.app, params.store.into()).await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(
                format::versions(&report),
            )])),
            Err(e) => Ok(tool_failure("release-check-versions", &e)),
        }
    }

    #[tool(
        name = "release-create-version",
        description = "Create a new App Store version (given or latest bumped) and, with versionCodes, a draft Google Play release"
    )]
    async fn release_create_version(
        &self,
        Parameters(params): Parameters<CreateVersionParams>,
    ) -> Result<CallToolResult, McpError> {
        let options = CreateVersionOptions {
            app: params.app,
            stores: params.store.into(),
            version_string: params.version_string,
            version_codes: params.version_codes,
            track: params.track,
        };
        match workflow::create_version(&self.ctx, options).await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(
                format::created_version(&report),
            )])),
            Err(e) => Ok(tool_failure("release-create-version", &e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for PabalMcp {
    fn get_info(&self) -> ServerInfo {
        let configured: Vec<String> = Store::ALL
            .iter()
            .filter(|store| match store {
                Store::AppStore => self.ctx.config().app_store.is_some(),
                Store::GooglePlay => self.ctx.config().google_play.is_some(),
            })
            .map(ToString::to_string)
            .collect();

        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "pabal-mcp manages App Store and Google Play listing metadata. \
                 Register apps with apps-add, then aso-pull, aso-prepare, edit pushData \
                 and aso-push. Release notes go through release-update-notes, which asks \
                 for translations of missing locales before updating the stores. \
                 Configured stores: {}.",
                if configured.is_empty() {
                    "none".to_string()
                } else {
                    configured.join(", ")
                }
            )),
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
