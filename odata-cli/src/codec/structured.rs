//! Recursive entity/complex type codec with discriminator dispatch

use std::collections::BTreeMap;

use crate::codec::Parser;
use crate::edm::{CodecOptions, MetadataLevel, Version};
use crate::error::{ODataError, Result, child_path};
use crate::resource::KeyValue;
use crate::schema::{FieldDefinition, SchemaRegistry, StructuredType};
use crate::value::{Entity, ODataValue};

const V4_TYPE: &str = "@odata.type";
const V3_TYPE: &str = "odata.type";
const V2_METADATA: &str = "__metadata";
const V2_DEFERRED: &str = "__deferred";

/// Concrete type named by a payload, in any protocol version's spelling
///
/// `{"@odata.type": "#NS.T"}`, `{"odata.type": "NS.T"}` and
/// `{"__metadata": {"type": "NS.T"}}` all yield `NS.T`.
pub fn discriminator_of(json: &serde_json::Value) -> Option<String> {
    let obj = json.as_object()?;
    let raw = obj
        .get(V4_TYPE)
        .or_else(|| obj.get(V3_TYPE))
        .or_else(|| obj.get(V2_METADATA).and_then(|m| m.get("type")))?
        .as_str()?;
    // May be a bare `#NS.T` or a full `<service>/$metadata#NS.T`
    let name = raw.rsplit('#').next().unwrap_or(raw);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parser for one entity or complex type
#[derive(Debug, Clone, Copy)]
pub struct TypeParser<'r> {
    registry: &'r SchemaRegistry,
    ty: &'r StructuredType,
}

impl<'r> TypeParser<'r> {
    pub(crate) fn new(registry: &'r SchemaRegistry, ty: &'r StructuredType) -> Self {
        Self { registry, ty }
    }

    pub fn type_name(&self) -> String {
        self.ty.type_name()
    }

    pub fn definition(&self) -> &'r StructuredType {
        self.ty
    }

    /// Flattened fields, inherited first
    pub fn fields(&self) -> &'r [FieldDefinition] {
        &self.ty.fields
    }

    pub fn field(&self, name: &str) -> Option<&'r FieldDefinition> {
        self.ty.field(name)
    }

    pub fn keys(&self) -> &'r [String] {
        &self.ty.keys
    }

    /// True if `candidate` is this type or registered as derived from it
    pub fn is_type_of(&self, candidate: &str) -> bool {
        self.registry.is_type_of(&self.type_name(), candidate)
    }

    /// Most specific parser for a discriminator; falls back to this parser
    /// when the named type is not in this type's hierarchy
    pub fn find_parser(&self, candidate: &str) -> TypeParser<'r> {
        if self.is_type_of(candidate) {
            if let Ok(parser) = self.registry.structured(candidate) {
                return parser;
            }
        }
        log::warn!(
            "Payload type '{}' is not '{}' or derived from it, decoding as the expected type",
            candidate,
            self.type_name()
        );
        *self
    }

    /// Codec bound to one field
    pub fn parser_for_field(&self, name: &str) -> Result<Parser<'r>> {
        let field = self.field(name).ok_or_else(|| {
            ODataError::unknown_type(format!("{}/{}", self.type_name(), name))
        })?;
        self.registry.parser_for_field(field)
    }

    pub fn deserialize(&self, json: &serde_json::Value, options: &CodecOptions) -> Result<ODataValue> {
        self.deserialize_at(json, "", options)
    }

    pub fn serialize(&self, value: &ODataValue, options: &CodecOptions) -> Result<serde_json::Value> {
        self.serialize_at(value, "", options)
    }

    pub(crate) fn deserialize_at(
        &self,
        json: &serde_json::Value,
        path: &str,
        options: &CodecOptions,
    ) -> Result<ODataValue> {
        let obj = match json {
            serde_json::Value::Null => return Ok(ODataValue::Null),
            serde_json::Value::Object(obj) => obj,
            other => return Err(ODataError::mismatch(path, self.type_name(), other)),
        };

        let discriminator = discriminator_of(json);
        let target = match &discriminator {
            Some(name) if *name != self.type_name() && options.metadata != MetadataLevel::None => {
                self.find_parser(name)
            }
            _ => *self,
        };

        let mut fields = BTreeMap::new();
        for (key, raw) in obj {
            let value = match target.field(key) {
                Some(field) => target.decode_field(field, raw, &child_path(path, key), options)?,
                None => ODataValue::Raw(raw.clone()),
            };
            fields.insert(key.clone(), value);
        }

        Ok(ODataValue::Entity(Entity {
            type_name: discriminator.map(|_| target.type_name()),
            fields,
        }))
    }

    pub(crate) fn serialize_at(
        &self,
        value: &ODataValue,
        path: &str,
        options: &CodecOptions,
    ) -> Result<serde_json::Value> {
        let entity = match value {
            ODataValue::Null => return Ok(serde_json::Value::Null),
            ODataValue::Raw(raw) => return Ok(raw.clone()),
            ODataValue::Entity(entity) => entity,
            other => return Err(ODataError::value_mismatch(path, self.type_name(), other)),
        };

        let own_name = self.type_name();
        let (target, derived) = match &entity.type_name {
            Some(name) if *name != own_name && self.is_type_of(name) => {
                (self.find_parser(name), true)
            }
            _ => (*self, false),
        };

        let mut out = serde_json::Map::new();
        for (key, field_value) in &entity.fields {
            let json = match target.field(key) {
                Some(field) => {
                    target.encode_field(field, field_value, &child_path(path, key), options)?
                }
                None => field_value.to_json(),
            };
            out.insert(key.clone(), json);
        }

        if derived {
            write_discriminator(&mut out, &target.type_name(), options.version);
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Key predicate for an instance, from the declared key fields
    pub fn key_of(&self, entity: &Entity) -> Result<KeyValue> {
        if self.ty.keys.is_empty() {
            return Err(ODataError::invalid_path(format!(
                "type '{}' declares no key",
                self.type_name()
            )));
        }

        let mut parts = Vec::with_capacity(self.ty.keys.len());
        for key in &self.ty.keys {
            let value = entity
                .get(key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| {
                    ODataError::invalid_path(format!(
                        "entity of type '{}' has no value for key '{}'",
                        self.type_name(),
                        key
                    ))
                })?;
            let literal = self.parser_for_field(key)?.to_literal(value)?;
            parts.push((key.clone(), literal));
        }

        if parts.len() == 1 {
            let (_, literal) = parts.remove(0);
            Ok(KeyValue::Single(literal))
        } else {
            Ok(KeyValue::Composite(parts))
        }
    }

    fn decode_field(
        &self,
        field: &FieldDefinition,
        raw: &serde_json::Value,
        path: &str,
        options: &CodecOptions,
    ) -> Result<ODataValue> {
        if raw.is_null() {
            return if field.nullable {
                Ok(ODataValue::Null)
            } else {
                Err(ODataError::mismatch(path, format!("non-null {}", field.declared_type()), raw))
            };
        }

        // 2.0 link to a navigation target that was not expanded
        if field.navigation && raw.get(V2_DEFERRED).is_some() {
            return Ok(ODataValue::Raw(raw.clone()));
        }

        let parser = self.registry.parser_for_field(field)?;
        if !field.collection {
            return parser.deserialize_at(raw, path, options);
        }

        // 2.0 verbose JSON wraps collections as {"results": [...]}
        let items = raw
            .as_array()
            .or_else(|| raw.get("results").and_then(|r| r.as_array()))
            .ok_or_else(|| ODataError::mismatch(path, field.declared_type(), raw))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| parser.deserialize_at(item, &format!("{}[{}]", path, i), options))
            .collect::<Result<Vec<_>>>()
            .map(ODataValue::Collection)
    }

    fn encode_field(
        &self,
        field: &FieldDefinition,
        value: &ODataValue,
        path: &str,
        options: &CodecOptions,
    ) -> Result<serde_json::Value> {
        match value {
            ODataValue::Null if !field.nullable => Err(ODataError::value_mismatch(
                path,
                format!("non-null {}", field.declared_type()),
                value,
            )),
            ODataValue::Null => Ok(serde_json::Value::Null),
            ODataValue::Raw(raw) => Ok(raw.clone()),
            ODataValue::Collection(items) if field.collection => {
                let parser = self.registry.parser_for_field(field)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| parser.serialize_at(item, &format!("{}[{}]", path, i), options))
                    .collect::<Result<Vec<_>>>()
                    .map(serde_json::Value::Array)
            }
            other if field.collection => {
                Err(ODataError::value_mismatch(path, field.declared_type(), other))
            }
            other => self.registry.parser_for_field(field)?.serialize_at(other, path, options),
        }
    }
}

/// Write a type discriminator unless the payload already carries one
fn write_discriminator(
    out: &mut serde_json::Map<String, serde_json::Value>,
    type_name: &str,
    version: Version,
) {
    match version {
        Version::V4 => {
            out.entry(V4_TYPE)
                .or_insert_with(|| serde_json::Value::String(format!("#{}", type_name)));
        }
        Version::V3 => {
            out.entry(V3_TYPE)
                .or_insert_with(|| serde_json::Value::String(type_name.to_string()));
        }
        Version::V2 => {
            let metadata = out
                .entry(V2_METADATA)
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let Some(obj) = metadata.as_object_mut() {
                obj.entry("type")
                    .or_insert_with(|| serde_json::Value::String(type_name.to_string()));
            }
        }
    }
}
