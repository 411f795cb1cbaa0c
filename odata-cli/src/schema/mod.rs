//! Schema registry: namespace type declarations bound to codecs
//!
//! Built once from an [`ApiConfig`] and read-only afterwards. Declarations
//! are registered by name in a first pass and fields are bound by name in a
//! second pass, so types may reference types declared later (or themselves).

mod field;

pub use field::{FieldDefinition, FieldType, StructuredType, TypeKind};

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::codec::{EnumCodec, Parser, PrimitiveCodec, TypeParser};
use crate::config::{ApiConfig, FieldConfig, StructuredTypeConfig};
use crate::edm::{CodecOptions, EdmKind};
use crate::error::{ODataError, Result};
use field::split_collection;

static GLOBAL_REGISTRY: OnceCell<Arc<SchemaRegistry>> = OnceCell::new();

/// Install the process-wide registry; fails if one is already installed
pub fn install(registry: SchemaRegistry) -> Result<Arc<SchemaRegistry>> {
    let registry = Arc::new(registry);
    GLOBAL_REGISTRY
        .set(registry.clone())
        .map_err(|_| ODataError::configuration("a schema registry is already installed"))?;
    Ok(registry)
}

/// The process-wide registry, if one was installed
pub fn global() -> Option<Arc<SchemaRegistry>> {
    GLOBAL_REGISTRY.get().cloned()
}

/// Fully-qualified name -> codec lookup plus the global codec options
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    service_root_url: String,
    options: CodecOptions,
    enums: HashMap<String, EnumCodec>,
    types: HashMap<String, StructuredType>,
}

/// First-pass entry: a declaration with its namespace
struct Declared<'c> {
    namespace: &'c str,
    kind: TypeKind,
    config: &'c StructuredTypeConfig,
}

impl SchemaRegistry {
    /// Build the registry; any configuration error aborts with no partial result
    pub fn configure(config: &ApiConfig) -> Result<Self> {
        let mut enums = HashMap::new();
        let mut declared: HashMap<String, Declared<'_>> = HashMap::new();

        // Pass 1: register every type name
        for schema in &config.schemas {
            if schema.namespace.is_empty() {
                return Err(ODataError::configuration("schema namespace must not be empty"));
            }
            for enum_config in &schema.enums {
                let codec = EnumCodec::from_config(&schema.namespace, enum_config)?;
                let name = codec.type_name();
                if enums.contains_key(&name) {
                    return Err(ODataError::configuration(format!(
                        "type '{}' is declared twice",
                        name
                    )));
                }
                enums.insert(name, codec);
            }

            let structured = schema
                .entities
                .iter()
                .map(|c| (TypeKind::Entity, c))
                .chain(schema.complexes.iter().map(|c| (TypeKind::Complex, c)));
            for (kind, type_config) in structured {
                let name = format!("{}.{}", schema.namespace, type_config.name);
                if enums.contains_key(&name) || declared.contains_key(&name) {
                    return Err(ODataError::configuration(format!(
                        "type '{}' is declared twice",
                        name
                    )));
                }
                declared.insert(
                    name,
                    Declared {
                        namespace: &schema.namespace,
                        kind,
                        config: type_config,
                    },
                );
            }
        }

        // Pass 2: flatten inheritance and bind field types by name
        let mut types = HashMap::with_capacity(declared.len());
        for (name, entry) in &declared {
            let ty = Self::flatten(name, entry, &declared, &enums)?;
            types.insert(name.clone(), ty);
        }

        // Derived-type links for discriminator dispatch
        let links: Vec<(String, String)> = types
            .iter()
            .filter_map(|(name, ty)| ty.base.clone().map(|base| (base, name.clone())))
            .collect();
        for (base, child) in links {
            if let Some(base_type) = types.get_mut(&base) {
                base_type.derived.push(child);
            }
        }
        for ty in types.values_mut() {
            ty.derived.sort();
        }

        log::debug!(
            "Configured schema registry: {} enum types, {} structured types",
            enums.len(),
            types.len()
        );

        Ok(Self {
            service_root_url: config.service_root_url.clone(),
            options: config.codec_options(),
            enums,
            types,
        })
    }

    /// Walk the base chain root-first and merge fields, child winning
    fn flatten(
        name: &str,
        entry: &Declared<'_>,
        declared: &HashMap<String, Declared<'_>>,
        enums: &HashMap<String, EnumCodec>,
    ) -> Result<StructuredType> {
        let mut chain = vec![(name.to_string(), entry)];
        let mut seen = HashSet::from([name.to_string()]);
        let mut current = entry;
        while let Some(base) = &current.config.base {
            let base_name = qualify(base, current.namespace, declared, enums);
            let base_entry = declared.get(&base_name).ok_or_else(|| {
                ODataError::configuration(format!(
                    "type '{}' derives from unknown type '{}'",
                    name, base
                ))
            })?;
            if !seen.insert(base_name.clone()) {
                return Err(ODataError::configuration(format!(
                    "inheritance cycle through '{}'",
                    base_name
                )));
            }
            chain.push((base_name, base_entry));
            current = base_entry;
        }

        let mut fields: Vec<FieldDefinition> = Vec::new();
        let mut keys: Vec<String> = Vec::new();
        for (type_name, level) in chain.iter().rev() {
            let mut own = HashSet::new();
            for field_config in &level.config.fields {
                if !own.insert(field_config.name.as_str()) {
                    return Err(ODataError::configuration(format!(
                        "type '{}' declares field '{}' twice",
                        type_name, field_config.name
                    )));
                }
                let field = bind_field(field_config, level.namespace, declared, enums)
                    .map_err(|e| match e {
                        ODataError::Configuration { message } => ODataError::configuration(
                            format!("{}.{}: {}", type_name, field_config.name, message),
                        ),
                        other => other,
                    })?;
                match fields.iter_mut().find(|f| f.name == field.name) {
                    Some(inherited) => *inherited = field,
                    None => fields.push(field),
                }
            }
            if !level.config.keys.is_empty() {
                keys = level.config.keys.clone();
            }
        }

        for key in &keys {
            if !fields.iter().any(|f| &f.name == key) {
                return Err(ODataError::configuration(format!(
                    "type '{}' declares key '{}' that is not a field",
                    name, key
                )));
            }
        }

        Ok(StructuredType {
            namespace: entry.namespace.to_string(),
            name: entry.config.name.clone(),
            kind: entry.kind,
            base: entry
                .config
                .base
                .as_ref()
                .map(|b| qualify(b, entry.namespace, declared, enums)),
            keys,
            fields,
            derived: Vec::new(),
        })
    }

    pub fn service_root_url(&self) -> &str {
        &self.service_root_url
    }

    /// Global codec options from configuration
    pub fn options(&self) -> CodecOptions {
        self.options
    }

    /// Codec for a type name (`Edm.*`, enum, entity, complex; `Collection(..)` unwraps)
    pub fn parser_for_type(&self, type_name: &str) -> Result<Parser<'_>> {
        let (inner, _) = split_collection(type_name);
        if let Some(kind) = EdmKind::from_name(inner) {
            return Ok(Parser::Primitive(PrimitiveCodec::new(kind)));
        }
        if let Some(codec) = self.enums.get(inner) {
            return Ok(Parser::Enum(codec));
        }
        self.structured(inner).map(Parser::Structured)
    }

    /// Entity/complex parser for a fully-qualified name
    pub fn structured(&self, type_name: &str) -> Result<TypeParser<'_>> {
        self.types
            .get(type_name)
            .map(|ty| TypeParser::new(self, ty))
            .ok_or_else(|| ODataError::unknown_type(type_name))
    }

    pub fn enum_codec(&self, type_name: &str) -> Result<&EnumCodec> {
        self.enums
            .get(type_name)
            .ok_or_else(|| ODataError::unknown_type(type_name))
    }

    /// Codec bound to a field's type
    pub fn parser_for_field(&self, field: &FieldDefinition) -> Result<Parser<'_>> {
        match &field.field_type {
            FieldType::Primitive(kind) => Ok(Parser::Primitive(PrimitiveCodec::new(*kind))),
            FieldType::Enum(name) => self.enum_codec(name).map(Parser::Enum),
            FieldType::Structured(name) => self.structured(name).map(Parser::Structured),
        }
    }

    /// True if `candidate` is `type_name` or reachable through derived-type links
    pub fn is_type_of(&self, type_name: &str, candidate: &str) -> bool {
        if type_name == candidate {
            return true;
        }
        let mut queue: VecDeque<&str> = VecDeque::from([type_name]);
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(ty) = self.types.get(current) else {
                continue;
            };
            for derived in &ty.derived {
                if derived == candidate {
                    return true;
                }
                queue.push_back(derived);
            }
        }
        false
    }

    /// All registered structured type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }
}

/// Qualify a bare type reference with the declaring namespace when that resolves
fn qualify(
    reference: &str,
    namespace: &str,
    declared: &HashMap<String, Declared<'_>>,
    enums: &HashMap<String, EnumCodec>,
) -> String {
    if declared.contains_key(reference) || enums.contains_key(reference) {
        return reference.to_string();
    }
    let local = format!("{}.{}", namespace, reference);
    if declared.contains_key(&local) || enums.contains_key(&local) {
        local
    } else {
        reference.to_string()
    }
}

fn bind_field(
    config: &FieldConfig,
    namespace: &str,
    declared: &HashMap<String, Declared<'_>>,
    enums: &HashMap<String, EnumCodec>,
) -> Result<FieldDefinition> {
    let (inner, wrapped) = split_collection(&config.type_name);
    let field_type = if let Some(kind) = EdmKind::from_name(inner) {
        FieldType::Primitive(kind)
    } else {
        let name = qualify(inner, namespace, declared, enums);
        if enums.contains_key(&name) {
            FieldType::Enum(name)
        } else if declared.contains_key(&name) {
            FieldType::Structured(name)
        } else {
            return Err(ODataError::configuration(format!(
                "unknown type reference '{}'",
                config.type_name
            )));
        }
    };

    Ok(FieldDefinition {
        name: config.name.clone(),
        field_type,
        nullable: config.nullable,
        collection: config.collection || wrapped,
        navigation: config.navigation,
    })
}
