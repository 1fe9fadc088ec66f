//! App Store Connect JSON:API payloads

use serde::{Deserialize, Serialize};

/// Top-level document for a single resource.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct Document<A> {
    pub data: Resource<A>,
}

/// Top-level document for a resource collection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de> + Default"))]
pub struct ListDocument<A> {
    pub data: Vec<Resource<A>>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Default, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,
    #[serde(default)]
    pub attributes: A,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppAttributes {
    pub name: Option<String>,
    pub bundle_id: Option<String>,
    pub primary_locale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreVersionAttributes {
    pub version_string: Option<String>,
    pub app_store_state: Option<String>,
    pub app_version_state: Option<String>,
    pub platform: Option<String>,
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoAttributes {
    pub app_store_state: Option<String>,
    pub state: Option<String>,
}

impl AppInfoAttributes {
    /// App info records for live versions are read-only.
    pub fn is_live(&self) -> bool {
        let state = self.state.as_deref().or(self.app_store_state.as_deref());
        matches!(state, Some("READY_FOR_SALE") | Some("READY_FOR_DISTRIBUTION"))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoLocalizationAttributes {
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_policy_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionLocalizationAttributes {
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whats_new: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotSetAttributes {
    pub screenshot_display_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotAttributes {
    pub file_name: Option<String>,
    pub image_asset: Option<ImageAsset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub template_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// `{"data": {"type", "id"?, "attributes", "relationships"?}}` request body.
pub fn request_body(
    kind: &str,
    id: Option<&str>,
    attributes: serde_json::Value,
    relationships: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut data = serde_json::json!({
        "type": kind,
        "attributes": attributes,
    });
    if let Some(id) = id {
        data["id"] = serde_json::json!(id);
    }
    if let Some(relationships) = relationships {
        data["relationships"] = relationships;
    }
    serde_json::json!({ "data": data })
}

/// `{"<name>": {"data": {"type", "id"}}}` relationship object.
pub fn relationship(name: &str, kind: &str, id: &str) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    object.insert(
        name.to_string(),
        serde_json::json!({ "data": { "type": kind, "id": id } }),
    );
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_document_with_next_link() {
        let json = r#"{
            "data": [
                {"type": "apps", "id": "123", "attributes": {"name": "App", "bundleId": "com.example.app"}}
            ],
            "links": {"self": "https://api/v1/apps", "next": "https://api/v1/apps?cursor=abc"}
        }"#;
        let doc: ListDocument<AppAttributes> = serde_json::from_str(json).unwrap();
        assert_eq!(doc.data[0].id, "123");
        assert_eq!(doc.data[0].attributes.bundle_id.as_deref(), Some("com.example.app"));
        assert_eq!(doc.links.next.as_deref(), Some("https://api/v1/apps?cursor=abc"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(
            "appStoreVersionLocalizations",
            None,
            serde_json::json!({"locale": "ko", "whatsNew": "수정"}),
            Some(relationship("appStoreVersion", "appStoreVersions", "v1")),
        );
        assert_eq!(body["data"]["type"], "appStoreVersionLocalizations");
        assert!(body["data"].get("id").is_none());
        assert_eq!(
            body["data"]["relationships"]["appStoreVersion"]["data"]["id"],
            "v1"
        );
    }

    #[test]
    fn test_app_info_live_state() {
        let live = AppInfoAttributes {
            app_store_state: Some("READY_FOR_SALE".to_string()),
            state: None,
        };
        assert!(live.is_live());
        let editable = AppInfoAttributes {
            app_store_state: None,
            state: Some("PREPARE_FOR_SUBMISSION".to_string()),
        };
        assert!(!editable.is_live());
    }
}
