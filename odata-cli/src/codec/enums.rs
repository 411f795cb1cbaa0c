//! Enum member resolution, plain and flags (bitmask) variants

use crate::config::EnumConfig;
use crate::edm::CodecOptions;
use crate::error::{ODataError, Result};
use crate::resource::Literal;
use crate::value::ODataValue;

const FLAGS_SEPARATOR: &str = ", ";

/// Codec for one enum type; `flags` is fixed when the schema is configured
#[derive(Debug, Clone, PartialEq)]
pub struct EnumCodec {
    namespace: String,
    name: String,
    /// Declared members in declaration order
    members: Vec<(String, i64)>,
    flags: bool,
}

impl EnumCodec {
    /// Build from a declaration, rejecting empty enums and duplicate members
    pub fn from_config(namespace: &str, config: &EnumConfig) -> Result<Self> {
        let type_name = format!("{}.{}", namespace, config.name);
        if config.members.is_empty() {
            return Err(ODataError::configuration(format!(
                "enum '{}' declares no members",
                type_name
            )));
        }

        let mut members: Vec<(String, i64)> = Vec::with_capacity(config.members.len());
        for member in &config.members {
            if member.name.is_empty() || member.name.contains(',') || member.name.contains('\'') {
                return Err(ODataError::configuration(format!(
                    "enum '{}' has invalid member name '{}'",
                    type_name, member.name
                )));
            }
            if members.iter().any(|(name, _)| name == &member.name) {
                return Err(ODataError::configuration(format!(
                    "enum '{}' declares member '{}' twice",
                    type_name, member.name
                )));
            }
            if config.flags && member.value < 0 {
                return Err(ODataError::configuration(format!(
                    "flags enum '{}' member '{}' has negative value {}",
                    type_name, member.name, member.value
                )));
            }
            members.push((member.name.clone(), member.value));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            name: config.name.clone(),
            members,
            flags: config.flags,
        })
    }

    /// Fully-qualified type name
    pub fn type_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn is_flags(&self) -> bool {
        self.flags
    }

    pub fn members(&self) -> &[(String, i64)] {
        &self.members
    }

    /// Member value for a name
    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| *value)
    }

    /// Member name for a value (plain enums)
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, member)| *member == value)
            .map(|(name, _)| name.as_str())
    }

    /// Names of the members whose bits are all set in `value`, in declared order
    pub fn flag_names(&self, value: i64) -> Vec<&str> {
        self.members
            .iter()
            .filter(|(_, bits)| *bits != 0 && value & bits == *bits)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Decode a member name, flags list, qualified literal or raw integer
    pub fn deserialize(
        &self,
        json: &serde_json::Value,
        path: &str,
        _options: &CodecOptions,
    ) -> Result<ODataValue> {
        match json {
            serde_json::Value::Null => Ok(ODataValue::Null),
            serde_json::Value::Number(n) => {
                let value = n
                    .as_i64()
                    .ok_or_else(|| ODataError::mismatch(path, self.type_name(), json))?;
                self.check_value(value)?;
                Ok(ODataValue::Enum(value))
            }
            serde_json::Value::String(text) => self.parse(text).map(ODataValue::Enum),
            other => Err(ODataError::mismatch(path, self.type_name(), other)),
        }
    }

    /// Encode a member value as a bare name or qualified literal
    pub fn serialize(
        &self,
        value: &ODataValue,
        path: &str,
        options: &CodecOptions,
    ) -> Result<serde_json::Value> {
        let bits = match value {
            ODataValue::Null => return Ok(serde_json::Value::Null),
            ODataValue::Enum(v) | ODataValue::Int(v) => *v,
            ODataValue::String(text) => self.parse(text)?,
            ODataValue::Raw(raw) => return Ok(raw.clone()),
            other => return Err(ODataError::value_mismatch(path, self.type_name(), other)),
        };

        let names = self.render(bits)?;
        if options.string_as_enum {
            Ok(serde_json::Value::String(names))
        } else {
            Ok(serde_json::Value::String(format!("{}'{}'", self.type_name(), names)))
        }
    }

    /// URL literal form, always namespace-qualified
    pub fn to_literal(&self, value: &ODataValue) -> Result<Literal> {
        let bits = match value {
            ODataValue::Enum(v) | ODataValue::Int(v) => *v,
            ODataValue::String(text) => self.parse(text)?,
            ODataValue::Null => return Ok(Literal::Null),
            other => return Err(ODataError::value_mismatch("", self.type_name(), other)),
        };
        Ok(Literal::Enum {
            type_name: self.type_name(),
            members: self.render(bits)?,
        })
    }

    /// Resolve text (bare or qualified) to a member value
    pub fn parse(&self, text: &str) -> Result<i64> {
        let inner = self.strip_qualifier(text);
        if self.flags {
            if inner.trim().is_empty() {
                return Ok(0);
            }
            inner
                .split(',')
                .map(|token| self.resolve_token(token.trim()))
                .try_fold(0i64, |acc, bits| bits.map(|b| acc | b))
        } else {
            self.resolve_token(inner.trim())
        }
    }

    fn render(&self, value: i64) -> Result<String> {
        if self.flags {
            Ok(self.flag_names(value).join(FLAGS_SEPARATOR))
        } else {
            self.name_of(value)
                .map(|name| name.to_string())
                .ok_or_else(|| ODataError::unknown_member(self.type_name(), value.to_string()))
        }
    }

    /// `Namespace.Enum'Member'` -> `Member`; other text is returned as-is
    fn strip_qualifier<'a>(&self, text: &'a str) -> &'a str {
        let type_name = self.type_name();
        text.strip_prefix(type_name.as_str())
            .and_then(|rest| rest.strip_prefix('\''))
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or(text)
    }

    fn resolve_token(&self, token: &str) -> Result<i64> {
        if let Some(value) = self.value_of(token) {
            return Ok(value);
        }
        if let Ok(value) = token.parse::<i64>() {
            self.check_value(value)?;
            return Ok(value);
        }
        Err(ODataError::unknown_member(self.type_name(), token))
    }

    fn check_value(&self, value: i64) -> Result<()> {
        let known = if self.flags {
            let mask = self.members.iter().fold(0i64, |acc, (_, bits)| acc | bits);
            value >= 0 && value & !mask == 0
        } else {
            self.name_of(value).is_some()
        };
        if known {
            Ok(())
        } else {
            Err(ODataError::unknown_member(self.type_name(), value.to_string()))
        }
    }
}
