//! Addressable resources: a path, its query options and its target type
//!
//! A `Resource` is an immutable value. Every derivation (`key`, `navigation_property`,
//! `select`, ...) returns a new resource and leaves the original untouched.

mod path;
mod query;

pub use path::{KeyValue, Literal, ResourcePath, Segment, SegmentKind};
pub use query::{Expand, ExpandTree, QueryOption, QueryOptions};

use std::fmt;
use std::sync::Arc;

use crate::codec::Parser;
use crate::error::{ODataError, Result};
use crate::schema::{FieldType, SchemaRegistry};
use crate::value::{Entity, ODataValue};

const COUNT_TYPE: &str = "Edm.Int32";

#[derive(Debug, Clone)]
pub struct Resource {
    registry: Arc<SchemaRegistry>,
    path: ResourcePath,
    query: QueryOptions,
    /// Fully-qualified type addressed by the path, when known
    type_name: Option<String>,
}

impl Resource {
    /// The service root; derive entity sets, singletons and operations from it
    pub fn root(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            path: ResourcePath::new(),
            query: QueryOptions::default(),
            type_name: None,
        }
    }

    /// An unaddressed resource of a known type, for decoding detached payloads
    pub fn of_type(registry: Arc<SchemaRegistry>, type_name: &str) -> Result<Self> {
        registry.parser_for_type(type_name)?;
        Ok(Self {
            type_name: Some(type_name.to_string()),
            ..Self::root(registry)
        })
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn resource_path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn query(&self) -> &QueryOptions {
        &self.query
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn derive(&self, segment: Segment, query: QueryOptions, type_name: Option<String>) -> Result<Self> {
        Ok(Self {
            registry: self.registry.clone(),
            path: self.path.append(segment)?,
            query,
            type_name,
        })
    }

    fn keep_format(&self) -> QueryOptions {
        self.query.keep(&[QueryOption::Format])
    }

    pub fn entity_set(&self, name: &str, type_name: &str) -> Result<Self> {
        let parser = self.registry.structured(type_name)?;
        self.derive(
            Segment::EntitySet(name.to_string()),
            self.keep_format(),
            Some(parser.type_name()),
        )
    }

    pub fn singleton(&self, name: &str, type_name: &str) -> Result<Self> {
        let parser = self.registry.structured(type_name)?;
        self.derive(
            Segment::Singleton(name.to_string()),
            self.keep_format(),
            Some(parser.type_name()),
        )
    }

    /// Action import, or an action bound to this resource
    pub fn action(&self, name: &str, return_type: Option<&str>) -> Result<Self> {
        self.derive(
            Segment::Action(name.to_string()),
            self.keep_format(),
            self.resolve_return_type(return_type)?,
        )
    }

    /// Function import, or a function bound to this resource
    pub fn function(
        &self,
        name: &str,
        parameters: Vec<(String, Literal)>,
        return_type: Option<&str>,
    ) -> Result<Self> {
        self.derive(
            Segment::Function {
                name: name.to_string(),
                parameters,
            },
            self.keep_format(),
            self.resolve_return_type(return_type)?,
        )
    }

    fn resolve_return_type(&self, return_type: Option<&str>) -> Result<Option<String>> {
        return_type
            .map(|name| self.registry.parser_for_type(name).map(|_| name.to_string()))
            .transpose()
    }

    pub fn key(&self, key: impl Into<KeyValue>) -> Result<Self> {
        self.derive(Segment::Key(key.into()), self.query.clone(), self.type_name.clone())
    }

    /// Key predicate taken from an entity's declared key fields
    pub fn entity_key(&self, entity: &Entity) -> Result<Self> {
        let type_name = self.require_type()?;
        let key = self.registry.structured(type_name)?.key_of(entity)?;
        self.key(key)
    }

    pub fn navigation_property(&self, name: &str) -> Result<Self> {
        let target = self.field_type(name)?;
        if !matches!(target, FieldType::Structured(_)) {
            return Err(ODataError::invalid_path(format!(
                "'{}' is not a navigation property of '{}'",
                name,
                self.type_name.as_deref().unwrap_or_default()
            )));
        }
        self.derive(
            Segment::NavigationProperty(name.to_string()),
            self.keep_format(),
            Some(target.type_name().to_string()),
        )
    }

    pub fn property(&self, name: &str) -> Result<Self> {
        let target = self.field_type(name)?;
        self.derive(
            Segment::Property(name.to_string()),
            self.query.clear(),
            Some(target.type_name().to_string()),
        )
    }

    /// Raw `$value` of a property or media entity
    pub fn value(&self) -> Result<Self> {
        self.derive(Segment::Value, self.query.clear(), self.type_name.clone())
    }

    /// `$count`; filtering and search still apply to what is counted
    pub fn count(&self) -> Result<Self> {
        self.derive(
            Segment::Count,
            self.query.keep(&[QueryOption::Filter, QueryOption::Search]),
            Some(COUNT_TYPE.to_string()),
        )
    }

    /// `$ref` addressing of an entity or navigation link
    pub fn reference(&self) -> Result<Self> {
        self.derive(Segment::Ref, self.keep_format(), self.type_name.clone())
    }

    fn require_type(&self) -> Result<&str> {
        self.type_name.as_deref().ok_or_else(|| {
            ODataError::invalid_path(format!("'{}' has no known target type", self.path))
        })
    }

    fn field_type(&self, name: &str) -> Result<FieldType> {
        let type_name = self.require_type()?;
        let parser = self.registry.structured(type_name)?;
        parser
            .field(name)
            .map(|field| field.field_type.clone())
            .ok_or_else(|| {
                ODataError::invalid_path(format!("type '{}' has no field '{}'", type_name, name))
            })
    }

    /// Same resource with its query options replaced
    pub fn with_query(&self, query: QueryOptions) -> Self {
        Self {
            query,
            ..self.clone()
        }
    }

    fn map_query(&self, f: impl FnOnce(QueryOptions) -> QueryOptions) -> Self {
        self.with_query(f(self.query.clone()))
    }

    pub fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map_query(|q| q.select(fields))
    }

    pub fn expand(&self, expand: Expand) -> Self {
        self.map_query(|q| q.expand(expand))
    }

    pub fn filter(&self, filter: impl Into<String>) -> Self {
        self.map_query(|q| q.filter(filter))
    }

    pub fn orderby(&self, orderby: impl Into<String>) -> Self {
        self.map_query(|q| q.orderby(orderby))
    }

    pub fn top(&self, top: u64) -> Self {
        self.map_query(|q| q.top(top))
    }

    pub fn skip(&self, skip: u64) -> Self {
        self.map_query(|q| q.skip(skip))
    }

    pub fn search(&self, search: impl Into<String>) -> Self {
        self.map_query(|q| q.search(search))
    }

    /// `$count=true` (4.0) or `$inlinecount=allpages` (2.0/3.0) alongside results
    pub fn inline_count(&self, count: bool) -> Self {
        self.map_query(|q| q.count(count))
    }

    pub fn format(&self, format: impl Into<String>) -> Self {
        self.map_query(|q| q.format(format))
    }

    pub fn custom(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map_query(|q| q.custom(name, value))
    }

    /// Relative path, with key literals in the configured version's grammar
    pub fn path(&self) -> String {
        self.path.to_path_for(self.registry.options().version)
    }

    pub fn query_string(&self) -> String {
        self.query.to_query_string_for(self.registry.options().version)
    }

    /// Absolute URL under the configured service root
    pub fn url(&self) -> String {
        let root = self.registry.service_root_url().trim_end_matches('/');
        format!("{}/{}", root, self)
    }

    /// Parser for the target type
    pub fn parser(&self) -> Result<Parser<'_>> {
        self.registry.parser_for_type(self.require_type()?)
    }

    pub fn serialize(&self, value: &ODataValue) -> Result<serde_json::Value> {
        self.parser()?.serialize(value, &self.registry.options())
    }

    pub fn deserialize(&self, json: &serde_json::Value) -> Result<ODataValue> {
        self.parser()?.deserialize(json, &self.registry.options())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query = self.query_string();
        if query.is_empty() {
            write!(f, "{}", self.path())
        } else {
            write!(f, "{}?{}", self.path(), query)
        }
    }
}
