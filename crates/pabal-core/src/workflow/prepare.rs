//! Copy pulled data into the editable push working copy

use pabal_metadata::{DataKind, Store};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::context::ServiceContext;
use crate::error::{PabalError, Result};

/// Options for [`prepare`]
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    pub app: String,
    /// Replace existing push data
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareReport {
    pub slug: String,
    pub files_copied: usize,
    pub overwritten: bool,
    /// Locales per store key (`appStore`, `googlePlay`)
    pub locales: BTreeMap<String, Vec<String>>,
}

pub async fn prepare(ctx: &ServiceContext, options: PrepareOptions) -> Result<PrepareReport> {
    let app = ctx.registry().resolve(&options.app)?;
    let storage = ctx.storage();

    if !storage.exists(DataKind::Pull, &app.slug) {
        return Err(PabalError::NotFound(format!(
            "No pulled data for '{}'; run aso-pull first",
            app.slug
        )));
    }

    let overwritten = storage.exists(DataKind::Push, &app.slug);
    if overwritten {
        if !options.overwrite {
            return Err(PabalError::Conflict(format!(
                "Push data for '{}' already exists; pass overwrite to replace it",
                app.slug
            )));
        }
        let dir = storage.product_dir(DataKind::Push, &app.slug)?;
        tokio::fs::remove_dir_all(&dir).await?;
    }

    let files_copied = storage
        .copy_product(&app.slug, DataKind::Pull, DataKind::Push)
        .await?;
    let data = storage.load_aso_data(DataKind::Push, &app.slug).await?;

    let locales = Store::ALL
        .iter()
        .filter(|store| data.has_store(**store))
        .map(|store| (store.key().to_string(), data.locale_codes(*store)))
        .collect();

    info!(slug = %app.slug, files = files_copied, overwritten, "prepared push data");
    Ok(PrepareReport {
        slug: app.slug,
        files_copied,
        overwritten,
        locales,
    })
}
