//! EDM vocabulary shared by the codecs: protocol versions, metadata levels
//! and primitive kinds

use serde::{Deserialize, Serialize};

/// OData protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "2.0")]
    V2,
    #[serde(rename = "3.0")]
    V3,
    #[serde(rename = "4.0")]
    V4,
}

impl Version {
    /// Parse a version header value such as `4.0`, `2.0;` or `3.0;NetFx`
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.split(';').next().unwrap_or("").trim();
        match trimmed {
            "2.0" | "2" => Some(Version::V2),
            "3.0" | "3" => Some(Version::V3),
            "4.0" | "4" | "4.01" => Some(Version::V4),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V2 => "2.0",
            Version::V3 => "3.0",
            Version::V4 => "4.0",
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V4
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response verbosity: which annotations accompany data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevel {
    None,
    Minimal,
    Full,
}

impl MetadataLevel {
    /// Parse `odata.metadata` (4.0) or `odata` (3.0) content-type parameter values
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "nometadata" => Some(MetadataLevel::None),
            "minimal" | "minimalmetadata" => Some(MetadataLevel::Minimal),
            "full" | "fullmetadata" | "verbose" => Some(MetadataLevel::Full),
            _ => None,
        }
    }
}

impl Default for MetadataLevel {
    fn default() -> Self {
        MetadataLevel::Minimal
    }
}

/// EDM primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmKind {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Binary,
    Date,
    TimeOfDay,
    DateTimeOffset,
    /// 2.0/3.0 `Edm.DateTime`, carried verbatim
    DateTime,
    Duration,
    Guid,
    /// Spatial and stream kinds, passed through without interpretation
    Opaque,
}

impl EdmKind {
    /// Resolve an `Edm.*` type name
    pub fn from_name(name: &str) -> Option<Self> {
        let local = name.strip_prefix("Edm.")?;
        let kind = match local {
            "Boolean" => EdmKind::Boolean,
            "Byte" => EdmKind::Byte,
            "SByte" => EdmKind::SByte,
            "Int16" => EdmKind::Int16,
            "Int32" => EdmKind::Int32,
            "Int64" => EdmKind::Int64,
            "Single" => EdmKind::Single,
            "Double" => EdmKind::Double,
            "Decimal" => EdmKind::Decimal,
            "String" => EdmKind::String,
            "Binary" => EdmKind::Binary,
            "Date" => EdmKind::Date,
            "TimeOfDay" => EdmKind::TimeOfDay,
            "DateTimeOffset" => EdmKind::DateTimeOffset,
            "DateTime" => EdmKind::DateTime,
            "Duration" | "Time" => EdmKind::Duration,
            "Guid" => EdmKind::Guid,
            "Stream" => EdmKind::Opaque,
            other if other.starts_with("Geography") || other.starts_with("Geometry") => {
                EdmKind::Opaque
            }
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EdmKind::Boolean => "Edm.Boolean",
            EdmKind::Byte => "Edm.Byte",
            EdmKind::SByte => "Edm.SByte",
            EdmKind::Int16 => "Edm.Int16",
            EdmKind::Int32 => "Edm.Int32",
            EdmKind::Int64 => "Edm.Int64",
            EdmKind::Single => "Edm.Single",
            EdmKind::Double => "Edm.Double",
            EdmKind::Decimal => "Edm.Decimal",
            EdmKind::String => "Edm.String",
            EdmKind::Binary => "Edm.Binary",
            EdmKind::Date => "Edm.Date",
            EdmKind::TimeOfDay => "Edm.TimeOfDay",
            EdmKind::DateTimeOffset => "Edm.DateTimeOffset",
            EdmKind::DateTime => "Edm.DateTime",
            EdmKind::Duration => "Edm.Duration",
            EdmKind::Guid => "Edm.Guid",
            EdmKind::Opaque => "Edm.Untyped",
        }
    }

    /// Inclusive integer range for the integral kinds
    pub fn int_range(&self) -> Option<(i64, i64)> {
        match self {
            EdmKind::Byte => Some((0, u8::MAX as i64)),
            EdmKind::SByte => Some((i8::MIN as i64, i8::MAX as i64)),
            EdmKind::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            EdmKind::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            EdmKind::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, EdmKind::Single | EdmKind::Double | EdmKind::Decimal)
    }
}

/// Options threaded through every serialize/deserialize call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecOptions {
    pub version: Version,
    pub metadata: MetadataLevel,
    /// Serialize non-flags enums as bare member names
    pub string_as_enum: bool,
    /// Int64 and Decimal travel as JSON strings
    pub ieee754_compatible: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            version: Version::V4,
            metadata: MetadataLevel::Minimal,
            string_as_enum: true,
            ieee754_compatible: false,
        }
    }
}
