//! Decoded OData value representation

use std::collections::BTreeMap;

/// A decoded value, produced by the codecs and consumed by their serializers
#[derive(Debug, Clone, PartialEq)]
pub enum ODataValue {
    /// Null/absent value
    Null,
    Boolean(bool),
    /// Byte, SByte, Int16, Int32 and Int64
    Int(i64),
    /// Single, Double and Decimal as a binary float; NaN and the infinities land here
    Float(f64),
    /// Finite Single, Double or Decimal in its written form (`3000`, `1.10`)
    Decimal(String),
    /// String and the verbatim text kinds (Binary, Date, TimeOfDay,
    /// DateTimeOffset, Duration, Guid)
    String(String),
    /// Enum member value (flags enums carry the OR of their bits)
    Enum(i64),
    /// Entity or complex type instance
    Entity(Entity),
    /// Collection-valued field
    Collection(Vec<ODataValue>),
    /// Data the schema does not describe, carried through untouched
    Raw(serde_json::Value),
}

/// An entity or complex type instance
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    /// Concrete type name when it was announced by a discriminator
    pub type_name: Option<String>,
    pub fields: BTreeMap<String, ODataValue>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance tagged with its concrete type
    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: ODataValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ODataValue> {
        self.fields.get(name)
    }
}

impl ODataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ODataValue::Null)
    }

    /// Variant name, used in mismatch messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            ODataValue::Null => "null",
            ODataValue::Boolean(_) => "boolean",
            ODataValue::Int(_) => "integer",
            ODataValue::Float(_) => "float",
            ODataValue::Decimal(_) => "decimal",
            ODataValue::String(_) => "string",
            ODataValue::Enum(_) => "enum",
            ODataValue::Entity(_) => "entity",
            ODataValue::Collection(_) => "collection",
            ODataValue::Raw(_) => "raw json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ODataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ODataValue::Int(i) | ODataValue::Enum(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ODataValue::Float(f) => Some(*f),
            ODataValue::Decimal(text) => text.parse().ok(),
            ODataValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ODataValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            ODataValue::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[ODataValue]> {
        match self {
            ODataValue::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Untyped conversion to JSON, for values that never went through a schema codec
    ///
    /// Non-finite floats map to their OData string spellings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ODataValue::Null => serde_json::Value::Null,
            ODataValue::Boolean(b) => serde_json::Value::Bool(*b),
            ODataValue::Int(i) | ODataValue::Enum(i) => serde_json::json!(*i),
            ODataValue::Float(f) => float_to_json(*f),
            ODataValue::Decimal(text) => decimal_to_json(text)
                .unwrap_or_else(|| serde_json::Value::String(text.clone())),
            ODataValue::String(s) => serde_json::Value::String(s.clone()),
            ODataValue::Entity(entity) => serde_json::Value::Object(
                entity
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ODataValue::Collection(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            ODataValue::Raw(raw) => raw.clone(),
        }
    }

    /// Untyped conversion from JSON
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => ODataValue::Null,
            serde_json::Value::Bool(b) => ODataValue::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ODataValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    ODataValue::Float(f)
                } else {
                    ODataValue::Raw(json.clone())
                }
            }
            serde_json::Value::String(s) => ODataValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                ODataValue::Collection(items.iter().map(ODataValue::from_json).collect())
            }
            serde_json::Value::Object(map) => ODataValue::Entity(Entity {
                type_name: None,
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), ODataValue::from_json(v)))
                    .collect(),
            }),
        }
    }
}

/// Encode a float as a JSON number, or as `NaN` / `INF` / `-INF`
pub(crate) fn float_to_json(f: f64) -> serde_json::Value {
    if f.is_nan() {
        serde_json::Value::String("NaN".to_string())
    } else if f.is_infinite() {
        let text = if f > 0.0 { "INF" } else { "-INF" };
        serde_json::Value::String(text.to_string())
    } else {
        serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// JSON number with exactly the written digits, if `text` is valid JSON number syntax
pub(crate) fn decimal_to_json(text: &str) -> Option<serde_json::Value> {
    serde_json::from_str::<serde_json::Number>(text)
        .ok()
        .map(serde_json::Value::Number)
}

impl std::fmt::Display for ODataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ODataValue::Null => write!(f, "(null)"),
            ODataValue::Boolean(b) => write!(f, "{}", b),
            ODataValue::Int(i) | ODataValue::Enum(i) => write!(f, "{}", i),
            ODataValue::Float(fl) => write!(f, "{}", fl),
            ODataValue::String(s) | ODataValue::Decimal(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl Default for ODataValue {
    fn default() -> Self {
        ODataValue::Null
    }
}

impl From<bool> for ODataValue {
    fn from(b: bool) -> Self {
        ODataValue::Boolean(b)
    }
}

impl From<i64> for ODataValue {
    fn from(i: i64) -> Self {
        ODataValue::Int(i)
    }
}

impl From<f64> for ODataValue {
    fn from(f: f64) -> Self {
        ODataValue::Float(f)
    }
}

impl From<&str> for ODataValue {
    fn from(s: &str) -> Self {
        ODataValue::String(s.to_string())
    }
}

impl From<String> for ODataValue {
    fn from(s: String) -> Self {
        ODataValue::String(s)
    }
}

impl From<Entity> for ODataValue {
    fn from(e: Entity) -> Self {
        ODataValue::Entity(e)
    }
}
