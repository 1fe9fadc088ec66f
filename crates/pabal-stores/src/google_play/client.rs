//! Google Play Developer API client
//!
//! Every change goes through an edit session: `create edit -> apply changes
//! -> commit`. Read-only flows delete their edit when done, and writes that
//! fail delete the edit instead of committing it.

use crate::auth::{restore_pem_newlines, TokenCache};
use crate::error::{Result, StoreError};
use crate::traits::GooglePlayApi;
use crate::types::*;
use chrono::{Duration, Utc};
use pabal_metadata::{GooglePlayLocaleData, GooglePlayScreenshots, Multilingual};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::models::*;

const API_BASE_URL: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

/// Google Play Developer API client
pub struct GooglePlayClient {
    service_account: ServiceAccountKey,
    client: Client,
    base_url: String,
    token_url: String,
    token_cache: RwLock<Option<TokenCache>>,
}

impl GooglePlayClient {
    /// Create a client from a service account key file
    pub fn new(config: GooglePlayConfig) -> Result<Self> {
        let key_content =
            std::fs::read_to_string(&config.service_account_key_path).map_err(|e| {
                StoreError::ConfigurationError(format!(
                    "Failed to read service account key {}: {}",
                    config.service_account_key_path.display(),
                    e
                ))
            })?;

        Self::from_json(&key_content)
    }

    /// Create a client from service account JSON content
    pub fn from_json(key_content: &str) -> Result<Self> {
        let mut service_account: ServiceAccountKey = serde_json::from_str(key_content)
            .map_err(|e| {
                StoreError::InvalidCredentials(format!("Invalid service account key: {}", e))
            })?;
        service_account.private_key = restore_pem_newlines(&service_account.private_key);

        jsonwebtoken::EncodingKey::from_rsa_pem(service_account.private_key.as_bytes()).map_err(
            |e| StoreError::InvalidCredentials(format!("Invalid private key: {}", e)),
        )?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        let token_url = service_account
            .token_uri
            .clone()
            .unwrap_or_else(|| TOKEN_URL.to_string());

        Ok(Self {
            service_account,
            client,
            base_url: API_BASE_URL.to_string(),
            token_url,
            token_cache: RwLock::new(None),
        })
    }

    /// Point the client at different API and token endpoints (proxies, tests)
    pub fn with_endpoints(mut self, base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    /// Service account email the client authenticates as
    pub fn client_email(&self) -> &str {
        &self.service_account.client_email
    }

    fn assertion(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            scope: &'a str,
            aud: &'a str,
            iat: i64,
            exp: i64,
        }

        let now = Utc::now();
        let claims = Claims {
            iss: &self.service_account.client_email,
            scope: SCOPE,
            aud: &self.token_url,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let encoding_key =
            jsonwebtoken::EncodingKey::from_rsa_pem(self.service_account.private_key.as_bytes())
                .map_err(|e| {
                    StoreError::InvalidCredentials(format!("Invalid private key: {}", e))
                })?;

        Ok(jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding_key,
        )?)
    }

    /// Get or refresh OAuth2 access token
    async fn access_token(&self) -> Result<String> {
        if let Some(cached) = self.token_cache.read().await.as_ref() {
            if let Some(token) = cached.valid_token() {
                return Ok(token.to_string());
            }
        }

        let jwt = self.assertion()?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::AuthenticationFailed(format!(
                "Token exchange for {} failed: {}",
                self.service_account.client_email, error_text
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        *self.token_cache.write().await = Some(TokenCache {
            token: token_response.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token_response.expires_in),
        });

        Ok(token_response.access_token)
    }

    /// Make an authenticated API request, returning the raw response
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.base_url, endpoint);

        debug!(method = %method, url = %url, "Google Play request");

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", token));

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::AuthenticationFailed(format!(
                "Google Play rejected the access token for {}: {}",
                self.service_account.client_email, error_text
            )));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(StoreError::from_response(status.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn api_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let response = self.send(method, endpoint, body).await?;
        Ok(response.json().await?)
    }

    fn edit_path(package_name: &str, edit_id: &str) -> String {
        format!("/applications/{}/edits/{}", package_name, edit_id)
    }

    /// Create a new edit session
    async fn create_edit(&self, package_name: &str) -> Result<String> {
        let endpoint = format!("/applications/{}/edits", package_name);
        let response: EditResponse = self
            .api_request(Method::POST, &endpoint, Some(serde_json::json!({})))
            .await?;
        debug!(package = %package_name, edit_id = %response.id, "Created edit");
        Ok(response.id)
    }

    /// Commit an edit
    async fn commit_edit(&self, package_name: &str, edit_id: &str) -> Result<()> {
        let endpoint = format!("{}:commit", Self::edit_path(package_name, edit_id));
        self.send(Method::POST, &endpoint, None).await?;
        info!(package = %package_name, edit_id = %edit_id, "Committed edit");
        Ok(())
    }

    /// Delete an edit; failures are logged since the edit expires anyway
    async fn delete_edit(&self, package_name: &str, edit_id: &str) {
        let endpoint = Self::edit_path(package_name, edit_id);
        if let Err(e) = self.send(Method::DELETE, &endpoint, None).await {
            warn!(package = %package_name, edit_id = %edit_id, error = %e, "Failed to delete edit");
        }
    }

    /// Commit when there is something to keep, otherwise discard
    async fn finish_edit(&self, package_name: &str, edit_id: &str, keep: bool) -> Result<()> {
        if !keep {
            self.delete_edit(package_name, edit_id).await;
            return Ok(());
        }
        if let Err(e) = self.commit_edit(package_name, edit_id).await {
            self.delete_edit(package_name, edit_id).await;
            return Err(e);
        }
        Ok(())
    }

    async fn get_details(&self, package_name: &str, edit_id: &str) -> Result<AppDetails> {
        let endpoint = format!("{}/details", Self::edit_path(package_name, edit_id));
        self.api_request(Method::GET, &endpoint, None).await
    }

    async fn get_listings(&self, package_name: &str, edit_id: &str) -> Result<Vec<Listing>> {
        let endpoint = format!("{}/listings", Self::edit_path(package_name, edit_id));
        let response: ListingsResponse = self.api_request(Method::GET, &endpoint, None).await?;
        Ok(response.listings)
    }

    async fn list_images(
        &self,
        package_name: &str,
        edit_id: &str,
        language: &str,
        image_type: &str,
    ) -> Vec<String> {
        let endpoint = format!(
            "{}/listings/{}/{}",
            Self::edit_path(package_name, edit_id),
            language,
            image_type
        );
        match self
            .api_request::<ImagesResponse>(Method::GET, &endpoint, None)
            .await
        {
            Ok(response) => response.images.into_iter().filter_map(|i| i.url).collect(),
            Err(e) => {
                warn!(language = %language, image_type = %image_type, error = %e, "Failed to list images");
                Vec::new()
            }
        }
    }

    async fn get_track(&self, package_name: &str, edit_id: &str, track: &str) -> Result<Track> {
        let endpoint = format!("{}/tracks/{}", Self::edit_path(package_name, edit_id), track);
        match self.api_request(Method::GET, &endpoint, None).await {
            Err(e) if e.is_not_found() => Ok(Track {
                track: track.to_string(),
                releases: Vec::new(),
            }),
            other => other,
        }
    }

    async fn put_track(&self, package_name: &str, edit_id: &str, track: &Track) -> Result<()> {
        let endpoint = format!(
            "{}/tracks/{}",
            Self::edit_path(package_name, edit_id),
            track.track
        );
        self.send(Method::PUT, &endpoint, Some(serde_json::to_value(track)?))
            .await?;
        Ok(())
    }

    async fn patch_listing(
        &self,
        package_name: &str,
        edit_id: &str,
        locale: &str,
        data: &GooglePlayLocaleData,
    ) -> Result<()> {
        let listing = Listing {
            language: locale.to_string(),
            title: data.title.clone(),
            short_description: data.short_description.clone(),
            full_description: data.full_description.clone(),
            video: data.video.clone(),
        };
        let endpoint = format!(
            "{}/listings/{}",
            Self::edit_path(package_name, edit_id),
            locale
        );
        self.send(Method::PATCH, &endpoint, Some(serde_json::to_value(&listing)?))
            .await?;
        Ok(())
    }

    async fn patch_details(
        &self,
        package_name: &str,
        edit_id: &str,
        data: &GooglePlayLocaleData,
    ) -> Result<()> {
        let details = AppDetails {
            default_language: data.default_language.clone(),
            contact_email: data.contact_email.clone(),
            contact_website: data.contact_website.clone(),
            contact_phone: data.contact_phone.clone(),
        };
        let endpoint = format!("{}/details", Self::edit_path(package_name, edit_id));
        self.send(Method::PATCH, &endpoint, Some(serde_json::to_value(&details)?))
            .await?;
        Ok(())
    }
}

fn sorted_releases(track: &Track) -> Vec<GooglePlayRelease> {
    let mut releases: Vec<GooglePlayRelease> = track
        .releases
        .iter()
        .map(|release| release.to_release(&track.track))
        .collect();
    releases.sort_by_key(|release| std::cmp::Reverse(release.max_version_code()));
    releases
}

#[async_trait::async_trait]
impl GooglePlayApi for GooglePlayClient {
    async fn check_auth(&self) -> Result<AuthStatus> {
        self.access_token().await?;
        Ok(AuthStatus {
            account: self.service_account.client_email.clone(),
            detail: "OAuth access token issued for the Android Publisher scope".to_string(),
        })
    }

    async fn find_app(&self, package_name: &str) -> Result<Option<GooglePlayApp>> {
        let edit_id = match self.create_edit(package_name).await {
            Ok(edit_id) => edit_id,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let result: Result<Option<GooglePlayApp>> = async {
            let details = self.get_details(package_name, &edit_id).await?;
            let listings = self.get_listings(package_name, &edit_id).await?;

            let title = details
                .default_language
                .as_deref()
                .and_then(|lang| listings.iter().find(|l| l.language == lang))
                .or_else(|| listings.first())
                .and_then(|listing| listing.title.clone());

            Ok(Some(GooglePlayApp {
                package_name: package_name.to_string(),
                title,
                default_language: details.default_language,
            }))
        }
        .await;

        self.delete_edit(package_name, &edit_id).await;
        result
    }

    async fn pull_all_locales(
        &self,
        package_name: &str,
    ) -> Result<Multilingual<GooglePlayLocaleData>> {
        let edit_id = self.create_edit(package_name).await?;

        let result: Result<Multilingual<GooglePlayLocaleData>> = async {
            let details = self.get_details(package_name, &edit_id).await?;
            let listings = self.get_listings(package_name, &edit_id).await?;

            let mut locales = BTreeMap::new();
            for listing in listings {
                let mut entry = GooglePlayLocaleData::new(&listing.language);
                entry.title = listing.title;
                entry.short_description = listing.short_description;
                entry.full_description = listing.full_description;
                entry.video = listing.video;
                entry.package_name = Some(package_name.to_string());
                entry.default_language = details.default_language.clone();
                entry.contact_email = details.contact_email.clone();
                entry.contact_website = details.contact_website.clone();
                entry.contact_phone = details.contact_phone.clone();

                for (form_factor, image_type) in GooglePlayScreenshots::IMAGE_TYPES {
                    let images = self
                        .list_images(package_name, &edit_id, &listing.language, image_type)
                        .await;
                    if let Some(slot) = entry.screenshots.get_mut(form_factor) {
                        *slot = images;
                    }
                }
                entry.feature_graphic = self
                    .list_images(package_name, &edit_id, &listing.language, "featureGraphic")
                    .await
                    .into_iter()
                    .next();

                locales.insert(listing.language, entry);
            }

            let default_locale = details
                .default_language
                .filter(|language| locales.contains_key(language));

            info!(package = %package_name, locales = locales.len(), "Pulled Google Play metadata");

            Multilingual::new(locales, default_locale).map_err(|_| {
                StoreError::NotFound(format!("No Google Play listings found for {}", package_name))
            })
        }
        .await;

        self.delete_edit(package_name, &edit_id).await;
        result
    }

    async fn push_metadata(
        &self,
        package_name: &str,
        data: &Multilingual<GooglePlayLocaleData>,
    ) -> Result<LocaleUpdateReport> {
        let edit_id = self.create_edit(package_name).await?;
        let mut report = LocaleUpdateReport::default();
        let mut details_updated = false;

        let details_source = data
            .get(data.default_locale())
            .filter(|entry| entry.has_details_fields())
            .or_else(|| {
                data.iter()
                    .map(|(_, entry)| entry)
                    .find(|entry| entry.has_details_fields())
            });

        if let Some(entry) = details_source {
            match self.patch_details(package_name, &edit_id, entry).await {
                Ok(()) => details_updated = true,
                Err(e) => {
                    warn!(package = %package_name, error = %e, "Failed to update app details");
                    report.record_failure("details", e);
                }
            }
        }

        for (locale, entry) in data.iter() {
            if !entry.has_listing_fields() {
                continue;
            }
            match self.patch_listing(package_name, &edit_id, locale, entry).await {
                Ok(()) => report.updated.push(locale.clone()),
                Err(e) => {
                    warn!(package = %package_name, locale = %locale, error = %e, "Failed to update listing");
                    report.record_failure(locale.clone(), e);
                }
            }
        }

        let keep = details_updated || !report.updated.is_empty();
        self.finish_edit(package_name, &edit_id, keep).await?;

        info!(
            package = %package_name,
            updated = report.updated.len(),
            failed = report.failed.len(),
            committed = keep,
            "Pushed Google Play listings"
        );
        Ok(report)
    }

    async fn list_releases(
        &self,
        package_name: &str,
        track: &str,
    ) -> Result<Vec<GooglePlayRelease>> {
        let edit_id = self.create_edit(package_name).await?;
        let result = self.get_track(package_name, &edit_id, track).await;
        self.delete_edit(package_name, &edit_id).await;

        Ok(sorted_releases(&result?))
    }

    async fn create_release(
        &self,
        package_name: &str,
        track: &str,
        version_codes: &[String],
        release_name: Option<&str>,
    ) -> Result<GooglePlayRelease> {
        if version_codes.is_empty() {
            return Err(StoreError::InvalidInput(
                "At least one version code is required".to_string(),
            ));
        }

        let edit_id = self.create_edit(package_name).await?;

        let result: Result<GooglePlayRelease> = async {
            let mut current = self.get_track(package_name, &edit_id, track).await?;
            current.releases.retain(|release| release.status != "draft");

            let release = TrackRelease {
                name: release_name.map(str::to_string),
                version_codes: version_codes.to_vec(),
                status: "draft".to_string(),
                release_notes: Vec::new(),
                user_fraction: None,
            };
            current.releases.push(release.clone());

            self.put_track(package_name, &edit_id, &current).await?;
            Ok(release.to_release(track))
        }
        .await;

        self.finish_edit(package_name, &edit_id, result.is_ok()).await?;
        if result.is_ok() {
            info!(package = %package_name, track = %track, "Created draft release");
        }
        result
    }

    async fn update_release_notes(
        &self,
        package_name: &str,
        track: &str,
        version_code: Option<&str>,
        notes: &BTreeMap<String, String>,
    ) -> Result<LocaleUpdateReport> {
        let edit_id = self.create_edit(package_name).await?;

        let result: Result<()> = async {
            let mut current = self.get_track(package_name, &edit_id, track).await?;

            let index = match version_code {
                Some(code) => current
                    .releases
                    .iter()
                    .position(|release| release.contains_version_code(code)),
                None => current
                    .releases
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, release)| release.to_release(track).max_version_code())
                    .map(|(index, _)| index),
            }
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "No release found on track {} for {}",
                    track, package_name
                ))
            })?;

            current.releases[index].merge_release_notes(notes);
            self.put_track(package_name, &edit_id, &current).await
        }
        .await;

        let mut report = LocaleUpdateReport::default();
        match result {
            Ok(()) => {
                self.finish_edit(package_name, &edit_id, true).await?;
                report.updated = notes.keys().cloned().collect();
            }
            Err(e) if e.is_not_found() => {
                self.delete_edit(package_name, &edit_id).await;
                return Err(e);
            }
            Err(e) => {
                warn!(package = %package_name, track = %track, error = %e, "Failed to update release notes");
                self.delete_edit(package_name, &edit_id).await;
                for locale in notes.keys() {
                    report.record_failure(locale.clone(), &e);
                }
            }
        }

        Ok(report)
    }

    async fn supported_locales(&self, package_name: &str) -> Result<Vec<String>> {
        let edit_id = self.create_edit(package_name).await?;
        let result = self.get_listings(package_name, &edit_id).await;
        self.delete_edit(package_name, &edit_id).await;

        let mut locales: Vec<String> = result?.into_iter().map(|l| l.language).collect();
        locales.sort();
        Ok(locales)
    }
}
