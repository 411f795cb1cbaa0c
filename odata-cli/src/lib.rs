//! OData client core
//!
//! Schema-driven encoding and decoding of EDM values, resource path and
//! query option construction, and version-aware response envelope decoding
//! for OData 2.0, 3.0 and 4.0 services. No network I/O happens here: the
//! transport supplies parsed JSON bodies and header lookups.

pub mod cli;
pub mod codec;
pub mod config;
pub mod edm;
pub mod error;
pub mod resource;
pub mod response;
pub mod schema;
pub mod value;

pub use codec::{EnumCodec, Parser, PrimitiveCodec, TypeParser};
pub use config::ApiConfig;
pub use edm::{CodecOptions, EdmKind, MetadataLevel, Version};
pub use error::{ODataError, Result};
pub use resource::{Expand, KeyValue, Literal, QueryOption, QueryOptions, Resource, ResourcePath, Segment};
pub use response::{Annotations, HeaderLookup, Payload, ResponseEnvelope, ResponseOptions};
pub use schema::SchemaRegistry;
pub use value::{Entity, ODataValue};
