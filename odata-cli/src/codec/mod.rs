//! Value codecs: primitives, enums and structured (entity/complex) types

mod enums;
mod primitive;
mod structured;

pub use enums::EnumCodec;
pub use primitive::PrimitiveCodec;
pub use structured::{TypeParser, discriminator_of};

use crate::edm::CodecOptions;
use crate::error::{ODataError, Result};
use crate::resource::Literal;
use crate::value::ODataValue;

/// Codec for any registered type, as returned by `SchemaRegistry::parser_for_type`
#[derive(Debug, Clone, Copy)]
pub enum Parser<'r> {
    Primitive(PrimitiveCodec),
    Enum(&'r EnumCodec),
    Structured(TypeParser<'r>),
}

impl<'r> Parser<'r> {
    /// Fully-qualified name of the type this parser handles
    pub fn type_name(&self) -> String {
        match self {
            Parser::Primitive(codec) => codec.type_name().to_string(),
            Parser::Enum(codec) => codec.type_name(),
            Parser::Structured(parser) => parser.type_name(),
        }
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
        match self {
            Parser::Primitive(codec) => codec.deserialize(json, path, options),
            Parser::Enum(codec) => codec.deserialize(json, path, options),
            Parser::Structured(parser) => parser.deserialize_at(json, path, options),
        }
    }

    pub(crate) fn serialize_at(
        &self,
        value: &ODataValue,
        path: &str,
        options: &CodecOptions,
    ) -> Result<serde_json::Value> {
        match self {
            Parser::Primitive(codec) => codec.serialize(value, path, options),
            Parser::Enum(codec) => codec.serialize(value, path, options),
            Parser::Structured(parser) => parser.serialize_at(value, path, options),
        }
    }

    /// URL literal for key predicates and function parameters
    pub fn to_literal(&self, value: &ODataValue) -> Result<Literal> {
        match self {
            Parser::Primitive(codec) => codec.to_literal(value),
            Parser::Enum(codec) => codec.to_literal(value),
            Parser::Structured(parser) => Err(ODataError::value_mismatch(
                "",
                format!("primitive or enum value, not {}", parser.type_name()),
                value,
            )),
        }
    }

    pub fn as_structured(&self) -> Option<&TypeParser<'r>> {
        match self {
            Parser::Structured(parser) => Some(parser),
            _ => None,
        }
    }
}
