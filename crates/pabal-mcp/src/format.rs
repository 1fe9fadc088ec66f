//! Text rendering of workflow reports for tool output

use pabal_core::workflow::{
    AuthCheckResult, CreateVersionReport, PrepareReport, PullReleaseNotesReport, PullReport,
    PushReport, PushSource, ReleaseNotesReport, StoreFailure, TranslationRequest, VersionsReport,
};
use pabal_core::RegisteredApp;
use serde::Serialize;

/// Wrap a payload as the `{"_meta": ...}` text block that follows the summary
pub fn meta_text<T: Serialize>(meta: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "_meta": meta }))
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn push_failures(lines: &mut Vec<String>, failed: &[StoreFailure]) {
    for failure in failed {
        lines.push(format!(
            "✗ {} ({}): {}",
            failure.store, failure.kind, failure.error
        ));
    }
}

pub fn app(app: &RegisteredApp) -> String {
    let mut lines = vec![format!("{} ({})", app.name, app.slug)];
    if let Some(entry) = &app.app_store {
        let mut line = format!("  App Store: {}", entry.bundle_id);
        if let Some(id) = &entry.app_id {
            line.push_str(&format!(" [id {}]", id));
        }
        lines.push(line);
        if let Some(locales) = &entry.supported_locales {
            lines.push(format!("    locales: {}", join_or_none(locales)));
        }
    }
    if let Some(entry) = &app.google_play {
        lines.push(format!("  Google Play: {}", entry.package_name));
        if let Some(locales) = &entry.supported_locales {
            lines.push(format!("    locales: {}", join_or_none(locales)));
        }
    }
    lines.join("\n")
}

pub fn registered(registered: &RegisteredApp) -> String {
    format!("✓ Registered app\n{}", app(registered))
}

pub fn apps(apps: &[RegisteredApp], query: Option<&str>) -> String {
    if apps.is_empty() {
        return match query {
            Some(query) => format!("No registered apps match '{}'", query),
            None => "No registered apps. Use apps-add to register one.".to_string(),
        };
    }

    let mut out = format!("{} registered app(s)", apps.len());
    for entry in apps {
        out.push_str("\n\n");
        out.push_str(&app(entry));
    }
    out
}

pub fn auth(results: &[AuthCheckResult]) -> String {
    results
        .iter()
        .map(|result| {
            if result.ok {
                match &result.account {
                    Some(account) => {
                        format!("✓ {}: authenticated as {} ({})", result.store, account, result.detail)
                    }
                    None => format!("✓ {}: {}", result.store, result.detail),
                }
            } else {
                format!(
                    "✗ {}: {} error: {}",
                    result.store,
                    result.error_kind.as_deref().unwrap_or("Upstream"),
                    result.detail
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn pull(report: &PullReport) -> String {
    let mut lines = vec![format!("Pulled ASO data for '{}'", report.slug)];
    for result in &report.pulled {
        lines.push(format!(
            "✓ {}: {} locale(s) [{}], default {}",
            result.store,
            result.locales.len(),
            result.locales.join(", "),
            result.default_locale
        ));
    }
    push_failures(&mut lines, &report.failed);

    for path in &report.saved {
        lines.push(format!("  saved {}", path.display()));
    }
    if report.screenshots_downloaded > 0 || !report.screenshot_failures.is_empty() {
        lines.push(format!(
            "Screenshots: {} downloaded, {} failed",
            report.screenshots_downloaded,
            report.screenshot_failures.len()
        ));
        for failure in &report.screenshot_failures {
            lines.push(format!("  ✗ {}", failure));
        }
    }
    lines.join("\n")
}

pub fn prepare(report: &PrepareReport) -> String {
    let mut lines = vec![format!(
        "✓ Prepared push data for '{}' ({} file(s) copied{})",
        report.slug,
        report.files_copied,
        if report.overwritten {
            ", previous push data replaced"
        } else {
            ""
        }
    )];
    for (store, locales) in &report.locales {
        lines.push(format!("  {}: {}", store, join_or_none(locales)));
    }
    lines.push("Edit the pushData files, then run aso-push.".to_string());
    lines.join("\n")
}

pub fn push(report: &PushReport) -> String {
    let source = match report.source {
        PushSource::PushData => "pushData",
        PushSource::PullData => "pullData (no prepared push data)",
    };
    let mut lines = vec![if report.dry_run {
        format!("Dry run for '{}' from {}", report.slug, source)
    } else {
        format!("Pushed ASO data for '{}' from {}", report.slug, source)
    }];

    if let Some(url) = &report.product_page_url {
        lines.push(format!("  product page URL: {}", url));
    }
    if report.dry_run {
        for (store, locales) in &report.planned {
            lines.push(format!("  would push {}: {}", store, join_or_none(locales)));
        }
        return lines.join("\n");
    }

    if let Some(result) = &report.app_store {
        lines.push(format!(
            "App Store: {} locale(s) pushed [{}]",
            result.pushed_locales.len(),
            result.pushed_locales.join(", ")
        ));
        for failure in &result.failed_fields {
            lines.push(format!(
                "  ! {} {}: {}",
                failure.locale, failure.field, failure.error
            ));
        }
        for failure in &result.failed_locales {
            lines.push(format!("  ✗ {}: {}", failure.locale, failure.error));
        }
        if result.needs_new_version {
            match &result.new_version {
                Some(version) => lines.push(format!(
                    "The current version is locked for edits. Created version {}.",
                    version
                )),
                None => lines.push(
                    "The current version is locked for edits and a new version is needed."
                        .to_string(),
                ),
            }
            if result.needs_whats_new_translation {
                lines.push(format!(
                    "Write what's new for [{}] and call aso-update-whats-new, then push again.",
                    result.whats_new_locales.join(", ")
                ));
            }
        }
    }

    if let Some(result) = &report.google_play {
        lines.push(format!(
            "Google Play: {} listing(s) updated [{}]",
            result.updated.len(),
            result.updated.join(", ")
        ));
        for failure in &result.failed {
            lines.push(format!("  ✗ {}: {}", failure.locale, failure.error));
        }
    }

    push_failures(&mut lines, &report.failed);
    lines.join("\n")
}

pub fn translation_request(slug: &str, request: &TranslationRequest) -> String {
    let stores = request
        .stores
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let lines = vec![
        format!(
            "Translation needed for '{}' ({}): {} of {} locale(s) have no text.",
            slug,
            stores,
            request.missing_locales.len(),
            request.required_locales.len()
        ),
        format!("Missing: {}", request.missing_locales.join(", ")),
        String::new(),
        format!("Source ({}):", request.source_locale),
        request.source_text.clone(),
        String::new(),
        "Translate the source text into every missing locale and call this tool again \
         with `notes` holding a text for every locale listed above."
            .to_string(),
    ];
    lines.join("\n")
}

pub fn release_notes(report: &ReleaseNotesReport) -> String {
    let mut lines = vec![format!("Release notes for '{}'", report.slug)];
    for result in &report.results {
        lines.push(format!(
            "✓ {} ({}): {} locale(s) updated [{}]",
            result.store,
            result.target,
            result.updated.len(),
            result.updated.join(", ")
        ));
        for failure in &result.failed {
            lines.push(format!("  ✗ {}: {}", failure.locale, failure.error));
        }
    }
    push_failures(&mut lines, &report.failed);
    lines.join("\n")
}

pub fn pulled_release_notes(report: &PullReleaseNotesReport) -> String {
    let mut lines = vec![format!("Release notes for '{}'", report.slug)];
    for note in &report.notes {
        lines.push(format!(
            "{} {}: {} locale(s)",
            note.platform,
            note.version_label(),
            note.release_notes.len()
        ));
        for (locale, text) in &note.release_notes {
            lines.push(format!("  [{}] {}", locale, text.replace('\n', "\n       ")));
        }
    }
    push_failures(&mut lines, &report.failed);
    lines.push(format!("Saved to {}", report.path.display()));
    lines.join("\n")
}

pub fn versions(report: &VersionsReport) -> String {
    let mut lines = vec![format!("Versions for '{}'", report.slug)];
    if let Some(version) = &report.app_store {
        lines.push(format!(
            "App Store: {} ({}, {})",
            version.version_string, version.app_store_state, version.platform
        ));
    }
    for (track, release) in &report.google_play {
        lines.push(format!(
            "Google Play {}: {} [{}] codes {}",
            track,
            release.release_name.as_deref().unwrap_or("unnamed"),
            release.status,
            release.version_codes.join(", ")
        ));
    }
    if report.app_store.is_none() && report.google_play.is_empty() && report.failed.is_empty() {
        lines.push("No versions found".to_string());
    }
    push_failures(&mut lines, &report.failed);
    lines.join("\n")
}

pub fn created_version(report: &CreateVersionReport) -> String {
    let mut lines = vec![format!("Versions created for '{}'", report.slug)];
    if let Some(version) = &report.app_store {
        lines.push(format!(
            "✓ App Store: {} ({})",
            version.version_string, version.app_store_state
        ));
    }
    if let Some(release) = &report.google_play {
        lines.push(format!(
            "✓ Google Play {}: {} release with codes {}",
            release.track,
            release.status,
            release.version_codes.join(", ")
        ));
    }
    push_failures(&mut lines, &report.failed);
    lines.join("\n")
}
