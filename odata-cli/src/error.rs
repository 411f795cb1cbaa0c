//! Error taxonomy for the OData codec and resource builders

/// Errors raised while configuring the schema, encoding/decoding values or
/// building resources
#[derive(Debug, Clone, PartialEq)]
pub enum ODataError {
    /// Invalid schema configuration (unknown type reference, duplicate field,
    /// invalid enum definition, inheritance cycle)
    Configuration { message: String },
    /// No codec is registered under the requested name
    UnknownType { type_name: String },
    /// A payload value does not conform to its declared EDM kind
    TypeMismatch {
        /// Dotted field path of the offending value (e.g. `Address.City`)
        path: String,
        expected: String,
        found: String,
    },
    /// An enum token or value could not be resolved to a declared member
    UnknownEnumMember { enum_type: String, member: String },
    /// Query option key outside the recognized set
    UnsupportedQueryOption { option: String },
    /// Resource path segment placed where the grammar does not allow it
    InvalidPath { message: String },
}

impl ODataError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    pub fn mismatch(path: &str, expected: impl Into<String>, found: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            found: json_shape(found).to_string(),
        }
    }

    /// Mismatch raised while serializing a decoded value
    pub fn value_mismatch(
        path: &str,
        expected: impl Into<String>,
        found: &crate::value::ODataValue,
    ) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            found: found.kind_name().to_string(),
        }
    }

    pub fn unknown_member(enum_type: impl Into<String>, member: impl Into<String>) -> Self {
        Self::UnknownEnumMember {
            enum_type: enum_type.into(),
            member: member.into(),
        }
    }

    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }
}

/// Short name of a JSON value's shape, used in mismatch messages
pub(crate) fn json_shape(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Append a field name to a dotted path
pub(crate) fn child_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

impl std::fmt::Display for ODataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ODataError::Configuration { message } => {
                write!(f, "Invalid schema configuration: {}", message)
            }
            ODataError::UnknownType { type_name } => {
                write!(f, "No parser registered for type '{}'", type_name)
            }
            ODataError::TypeMismatch {
                path,
                expected,
                found,
            } => {
                let at = if path.is_empty() { "<root>" } else { path.as_str() };
                write!(f, "Type mismatch at '{}': expected {}, found {}", at, expected, found)
            }
            ODataError::UnknownEnumMember { enum_type, member } => {
                write!(f, "'{}' is not a member of enum '{}'", member, enum_type)
            }
            ODataError::UnsupportedQueryOption { option } => {
                write!(f, "Unsupported query option '{}'", option)
            }
            ODataError::InvalidPath { message } => {
                write!(f, "Invalid resource path: {}", message)
            }
        }
    }
}

impl std::error::Error for ODataError {}

pub type Result<T> = std::result::Result<T, ODataError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mismatch_message_carries_path() {
        let err = ODataError::mismatch("Address.City", "Edm.String", &json!(12));
        assert_eq!(
            err.to_string(),
            "Type mismatch at 'Address.City': expected Edm.String, found number"
        );
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("", "Name"), "Name");
        assert_eq!(child_path("Friends[2]", "Name"), "Friends[2].Name");
    }
}
