//! Version-aware response envelope decoding
//!
//! The transport hands over status, headers and an already-parsed JSON body.
//! 2.0 payloads sit under `d` (collections under `d.results`); 3.0 and 4.0
//! payloads are the body itself (collections under `value`).

pub mod headers;
mod meta;
mod options;

pub use headers::HeaderLookup;
pub use meta::Annotations;
pub use options::ResponseOptions;

use once_cell::sync::OnceCell;

use crate::codec::Parser;
use crate::edm::{CodecOptions, MetadataLevel, Version};
use crate::error::{ODataError, Result};
use crate::resource::Resource;
use crate::value::ODataValue;

const V2_ROOT: &str = "d";
const V2_RESULTS: &str = "results";
const VALUE: &str = "value";

/// Decoded data and the annotations that accompanied it
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T> {
    pub data: T,
    pub meta: Annotations,
}

pub type EntityPayload = Payload<ODataValue>;
pub type EntitiesPayload = Payload<Vec<ODataValue>>;
pub type PropertyPayload = Payload<ODataValue>;

/// One response, decoded against the resource that was requested
pub struct ResponseEnvelope<H> {
    resource: Resource,
    status: u16,
    headers: H,
    body: Option<serde_json::Value>,
    options: OnceCell<ResponseOptions>,
}

impl<H: HeaderLookup> ResponseEnvelope<H> {
    pub fn new(resource: Resource, status: u16, headers: H, body: Option<serde_json::Value>) -> Self {
        Self {
            resource,
            status,
            headers,
            body: body.filter(|b| !b.is_null()),
            options: OnceCell::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &H {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Response options, computed on first use
    pub fn options(&self) -> &ResponseOptions {
        self.options
            .get_or_init(|| ResponseOptions::from_headers(&self.headers, &self.defaults()))
    }

    fn defaults(&self) -> CodecOptions {
        self.resource.registry().options()
    }

    fn codec_options(&self) -> CodecOptions {
        self.options().codec_options(&self.defaults())
    }

    /// The payload root: `d` in 2.0, the body otherwise
    fn payload(&self) -> Option<&serde_json::Value> {
        let body = self.body.as_ref()?;
        match self.options().version {
            Version::V2 => Some(body.get(V2_ROOT).unwrap_or(body)),
            Version::V3 | Version::V4 => Some(body),
        }
    }

    pub fn entity(&self) -> Result<Option<EntityPayload>> {
        let Some(payload) = self.payload() else {
            return Ok(None);
        };
        let (data, meta) = Annotations::split(payload);
        let data = self.decode_structured(&data, meta.type_name.as_deref())?;
        Ok(Some(Payload { data, meta }))
    }

    pub fn entities(&self) -> Result<Option<EntitiesPayload>> {
        let Some(payload) = self.payload() else {
            return Ok(None);
        };
        let (items, meta) = match payload {
            serde_json::Value::Array(items) => (items.clone(), Annotations::default()),
            other => {
                let (rest, meta) = Annotations::split(other);
                let items = match rest.get(VALUE).or_else(|| rest.get(V2_RESULTS)) {
                    Some(serde_json::Value::Array(items)) => items.clone(),
                    Some(found) => return Err(ODataError::mismatch(VALUE, "collection", found)),
                    None => {
                        return Err(ODataError::TypeMismatch {
                            path: VALUE.to_string(),
                            expected: "collection".to_string(),
                            found: "object without value or results".to_string(),
                        });
                    }
                };
                (items, meta)
            }
        };

        let data = items
            .iter()
            .map(|item| {
                let (fields, item_meta) = Annotations::split(item);
                self.decode_structured(&fields, item_meta.type_name.as_deref())
            })
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Decoded {} entities for {}", data.len(), self.resource);
        Ok(Some(Payload { data, meta }))
    }

    pub fn property(&self) -> Result<Option<PropertyPayload>> {
        let Some(payload) = self.payload() else {
            return Ok(None);
        };
        let version = self.options().version;
        let (rest, meta) = Annotations::split(payload);
        let raw = match rest.as_object() {
            Some(obj) if obj.contains_key(VALUE) => obj[VALUE].clone(),
            Some(obj) if obj.contains_key(V2_RESULTS) => obj[V2_RESULTS].clone(),
            // 2.0 wraps a single property as {"Name": value}
            Some(obj) if version == Version::V2 && obj.len() == 1 => {
                obj.values().next().cloned().unwrap_or_default()
            }
            _ => rest,
        };
        let data = match &raw {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.decode_any(item))
                .collect::<Result<Vec<_>>>()
                .map(ODataValue::Collection)?,
            other => self.decode_any(other)?,
        };
        Ok(Some(Payload { data, meta }))
    }

    /// Bare value (`$value`, `$count`, raw media)
    pub fn value(&self) -> Result<Option<ODataValue>> {
        match &self.body {
            Some(body) => self.decode_any(body).map(Some),
            None => Ok(None),
        }
    }

    /// Decode with the resource's parser; untyped resources pass values through
    fn decode_any(&self, raw: &serde_json::Value) -> Result<ODataValue> {
        if self.resource.type_name().is_none() {
            return Ok(ODataValue::from_json(raw));
        }
        match self.resource.parser()? {
            Parser::Structured(_) => {
                let (fields, meta) = Annotations::split(raw);
                self.decode_structured(&fields, meta.type_name.as_deref())
            }
            other => other.deserialize(raw, &self.codec_options()),
        }
    }

    /// Decode annotation-free entity data, dispatching on the announced type
    fn decode_structured(&self, data: &serde_json::Value, announced: Option<&str>) -> Result<ODataValue> {
        let options = self.codec_options();
        let parser = match self.resource.parser() {
            Ok(Parser::Structured(parser)) => parser,
            Ok(other) => return other.deserialize(data, &options),
            Err(_) if self.resource.type_name().is_none() => return Ok(ODataValue::from_json(data)),
            Err(e) => return Err(e),
        };

        let target = match announced {
            Some(name) if options.metadata != MetadataLevel::None => parser.find_parser(name),
            _ => parser,
        };
        let mut value = target.deserialize(data, &options)?;
        if announced.is_some() {
            if let ODataValue::Entity(entity) = &mut value {
                entity.type_name = Some(target.type_name());
            }
        }
        Ok(value)
    }
}
