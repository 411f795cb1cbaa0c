//! API configuration with builder pattern
//!
//! Holds the global codec options (protocol version, enum and number
//! representation, metadata level) together with the declarative schema
//! that the registry is built from. Loadable from TOML or JSON.

use serde::{Deserialize, Serialize};

use crate::edm::{CodecOptions, MetadataLevel, Version};
use crate::error::{ODataError, Result};

/// Global configuration for one OData service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub service_root_url: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default = "default_true")]
    pub string_as_enum: bool,
    #[serde(default)]
    pub ieee754_compatible: bool,
    #[serde(default)]
    pub metadata: MetadataLevel,
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

/// One namespace worth of type declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub namespace: String,
    #[serde(default)]
    pub enums: Vec<EnumConfig>,
    #[serde(default)]
    pub entities: Vec<StructuredTypeConfig>,
    #[serde(default)]
    pub complexes: Vec<StructuredTypeConfig>,
}

/// Enum type declaration; member order is significant for flags rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumConfig {
    pub name: String,
    #[serde(default)]
    pub flags: bool,
    pub members: Vec<EnumMemberConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumMemberConfig {
    pub name: String,
    pub value: i64,
}

/// Entity or complex type declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredTypeConfig {
    pub name: String,
    /// Fully-qualified base type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Key field names (entities only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// `Edm.*`, a fully-qualified enum/entity/complex name, or `Collection(...)`
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub navigation: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_root_url: String::new(),
            version: Version::V4,
            string_as_enum: true,
            ieee754_compatible: false,
            metadata: MetadataLevel::Minimal,
            schemas: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Create a new builder for ApiConfig
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::new()
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| ODataError::configuration(format!("invalid TOML config: {}", e)))
    }

    /// Build from an already-parsed JSON configuration value
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| ODataError::configuration(format!("invalid JSON config: {}", e)))
    }

    /// Codec options derived from the global settings
    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            version: self.version,
            metadata: self.metadata,
            string_as_enum: self.string_as_enum,
            ieee754_compatible: self.ieee754_compatible,
        }
    }
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            collection: false,
            navigation: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    pub fn navigation(mut self) -> Self {
        self.navigation = true;
        self
    }
}

impl StructuredTypeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }
}

impl EnumConfig {
    pub fn new(name: impl Into<String>, members: &[(&str, i64)]) -> Self {
        Self {
            name: name.into(),
            flags: false,
            members: members
                .iter()
                .map(|(name, value)| EnumMemberConfig {
                    name: name.to_string(),
                    value: *value,
                })
                .collect(),
        }
    }

    pub fn flags(mut self) -> Self {
        self.flags = true;
        self
    }
}

/// Builder for ApiConfig
#[derive(Debug)]
pub struct ApiConfigBuilder {
    config: ApiConfig,
}

impl ApiConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ApiConfig::default(),
        }
    }

    /// Set the service root URL
    pub fn service_root_url(mut self, url: impl Into<String>) -> Self {
        self.config.service_root_url = url.into();
        self
    }

    /// Set the protocol version
    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Serialize enums as bare member names instead of qualified literals
    pub fn string_as_enum(mut self, enabled: bool) -> Self {
        self.config.string_as_enum = enabled;
        self
    }

    /// Carry Int64 and Decimal values as strings
    pub fn ieee754_compatible(mut self, enabled: bool) -> Self {
        self.config.ieee754_compatible = enabled;
        self
    }

    /// Set the default metadata level
    pub fn metadata(mut self, level: MetadataLevel) -> Self {
        self.config.metadata = level;
        self
    }

    /// Add a namespace schema
    pub fn schema(mut self, schema: SchemaConfig) -> Self {
        self.config.schemas.push(schema);
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ApiConfig {
        self.config
    }
}

impl Default for ApiConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
