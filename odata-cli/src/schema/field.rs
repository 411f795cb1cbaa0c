//! Bound field and structured type definitions

use crate::edm::EdmKind;

/// What a field's declared type resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(EdmKind),
    /// Fully-qualified enum type name
    Enum(String),
    /// Fully-qualified entity or complex type name
    Structured(String),
}

impl FieldType {
    /// Fully-qualified name of the referenced type
    pub fn type_name(&self) -> &str {
        match self {
            FieldType::Primitive(kind) => kind.name(),
            FieldType::Enum(name) | FieldType::Structured(name) => name,
        }
    }
}

/// A field bound to its codec by type name
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    /// Array cardinality
    pub collection: bool,
    /// Relationship rather than inline data
    pub navigation: bool,
}

impl FieldDefinition {
    /// Type name as it would appear in a `$metadata` document
    pub fn declared_type(&self) -> String {
        if self.collection {
            format!("Collection({})", self.field_type.type_name())
        } else {
            self.field_type.type_name().to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Entity,
    Complex,
}

/// Entity or complex type with inherited fields already flattened in
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredType {
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    /// Fully-qualified base type name
    pub base: Option<String>,
    /// Key field names (own or inherited)
    pub keys: Vec<String>,
    /// Inherited fields first, then own fields; a child redefinition replaces
    /// the inherited entry in place
    pub fields: Vec<FieldDefinition>,
    /// Fully-qualified names of the types that directly derive from this one
    pub derived: Vec<String>,
}

impl StructuredType {
    pub fn type_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_entity(&self) -> bool {
        self.kind == TypeKind::Entity
    }
}

/// Split `Collection(X)` into (`X`, true); other names pass through
pub(crate) fn split_collection(type_name: &str) -> (&str, bool) {
    match type_name
        .trim()
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), true),
        None => (type_name.trim(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_collection() {
        assert_eq!(split_collection("Collection(Edm.String)"), ("Edm.String", true));
        assert_eq!(split_collection("Trippin.Person"), ("Trippin.Person", false));
    }

    #[test]
    fn test_declared_type() {
        let field = FieldDefinition {
            name: "Emails".into(),
            field_type: FieldType::Primitive(EdmKind::String),
            nullable: true,
            collection: true,
            navigation: false,
        };
        assert_eq!(field.declared_type(), "Collection(Edm.String)");
    }
}
