//! Payload annotations, split away from the data they describe
//!
//! Recognized spellings:
//! - 4.0: `@odata.etag`, `@odata.nextLink`, `Trips@odata.navigationLink`, ...
//! - 3.0: `odata.metadata`, `odata.etag`, `Trips@odata.navigationLinkUrl`, ...
//! - 2.0: `__metadata {uri, type, etag}`, `__deferred`, `__count`, `__next`

use std::collections::BTreeMap;

use serde::Serialize;

const V2_METADATA: &str = "__metadata";
const V2_DEFERRED: &str = "__deferred";
const V2_COUNT: &str = "__count";
const V2_NEXT: &str = "__next";

/// Annotations extracted from an entity, collection or property payload
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Concrete type named by the payload, without any `#` prefix
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_link: Option<String>,
    /// Field name -> navigation link
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub navigation_links: BTreeMap<String, String>,
    /// Field name -> association (`$ref`) link
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub association_links: BTreeMap<String, String>,
    /// Field name -> declared value type
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_types: BTreeMap<String, String>,
    /// Annotations with no dedicated slot, keyed as they appeared
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl Annotations {
    /// Split an object payload into plain data and its annotations
    ///
    /// Non-object payloads come back unchanged with empty annotations.
    pub fn split(payload: &serde_json::Value) -> (serde_json::Value, Annotations) {
        let mut meta = Annotations::default();
        let Some(obj) = payload.as_object() else {
            return (payload.clone(), meta);
        };

        let mut data = serde_json::Map::new();
        for (key, value) in obj {
            if key == V2_METADATA {
                meta.apply_v2_metadata(value);
            } else if key == V2_COUNT {
                meta.count = as_count(value);
            } else if key == V2_NEXT {
                meta.next_link = value.as_str().map(str::to_string);
            } else if let Some(name) = control_name(key) {
                meta.apply_control(key, name, value);
            } else if let Some((field, annotation)) = key.split_once('@') {
                meta.apply_field(key, field, annotation, value);
            } else if let Some(uri) = deferred_uri(value) {
                meta.navigation_links.insert(key.clone(), uri);
            } else {
                data.insert(key.clone(), value.clone());
            }
        }
        (serde_json::Value::Object(data), meta)
    }

    fn apply_v2_metadata(&mut self, metadata: &serde_json::Value) {
        let text = |key: &str| metadata.get(key).and_then(|v| v.as_str()).map(str::to_string);
        self.id = text("uri").or(self.id.take());
        self.type_name = text("type").or(self.type_name.take());
        self.etag = text("etag").or(self.etag.take());
        if let Some(media) = metadata.get("media_src") {
            self.other.insert("media_src".to_string(), media.clone());
        }
    }

    fn apply_control(&mut self, key: &str, name: &str, value: &serde_json::Value) {
        let text = || value.as_str().map(str::to_string);
        match name {
            "context" | "metadata" => self.context = text(),
            "etag" => self.etag = text(),
            "id" => self.id = text(),
            "type" => self.type_name = text().map(|t| strip_type_prefix(&t)),
            "editLink" => self.edit_link = text(),
            "readLink" => self.read_link = text(),
            "count" => self.count = as_count(value),
            "nextLink" => self.next_link = text(),
            "deltaLink" => self.delta_link = text(),
            _ => {
                self.other.insert(key.to_string(), value.clone());
            }
        }
    }

    fn apply_field(&mut self, key: &str, field: &str, annotation: &str, value: &serde_json::Value) {
        let name = annotation.strip_prefix("odata.").unwrap_or(annotation);
        let Some(text) = value.as_str() else {
            self.other.insert(key.to_string(), value.clone());
            return;
        };
        match name {
            "navigationLink" | "navigationLinkUrl" => {
                self.navigation_links.insert(field.to_string(), text.to_string());
            }
            "associationLink" | "associationLinkUrl" => {
                self.association_links.insert(field.to_string(), text.to_string());
            }
            "type" => {
                self.field_types.insert(field.to_string(), strip_type_prefix(text));
            }
            _ => {
                self.other.insert(key.to_string(), value.clone());
            }
        }
    }
}

/// `@odata.etag` / `odata.etag` / `@etag` -> `etag`; plain field names -> None
fn control_name(key: &str) -> Option<&str> {
    if let Some(rest) = key.strip_prefix('@') {
        return Some(rest.strip_prefix("odata.").unwrap_or(rest));
    }
    key.strip_prefix("odata.")
}

/// `#Trippin.Person` or `<root>/$metadata#Trippin.Person` -> `Trippin.Person`
fn strip_type_prefix(type_name: &str) -> String {
    type_name.rsplit('#').next().unwrap_or(type_name).to_string()
}

/// 2.0 counts arrive as strings
fn as_count(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// `{"__deferred": {"uri": "..."}}` placeholders for unexpanded navigation
fn deferred_uri(value: &serde_json::Value) -> Option<String> {
    value
        .get(V2_DEFERRED)?
        .get("uri")?
        .as_str()
        .map(str::to_string)
}
