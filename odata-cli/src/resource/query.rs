//! System query options and their query-string rendering
//!
//! Options render in a fixed order regardless of the order they were set:
//! `$select`, `$expand`, `$filter`, `$orderby`, `$top`, `$skip`, `$search`,
//! `$count`, `$format`, then custom options.

use std::collections::{BTreeMap, BTreeSet};

use crate::edm::Version;
use crate::error::{ODataError, Result};

/// Recognized option names, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryOption {
    Select,
    Expand,
    Filter,
    OrderBy,
    Top,
    Skip,
    Search,
    Count,
    Format,
    Custom,
}

impl QueryOption {
    pub const ALL: [QueryOption; 10] = [
        QueryOption::Select,
        QueryOption::Expand,
        QueryOption::Filter,
        QueryOption::OrderBy,
        QueryOption::Top,
        QueryOption::Skip,
        QueryOption::Search,
        QueryOption::Count,
        QueryOption::Format,
        QueryOption::Custom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueryOption::Select => "select",
            QueryOption::Expand => "expand",
            QueryOption::Filter => "filter",
            QueryOption::OrderBy => "orderby",
            QueryOption::Top => "top",
            QueryOption::Skip => "skip",
            QueryOption::Search => "search",
            QueryOption::Count => "count",
            QueryOption::Format => "format",
            QueryOption::Custom => "custom",
        }
    }

    /// Resolve an option name, with or without the `$` prefix
    pub fn from_name(name: &str) -> Result<Self> {
        let bare = name.strip_prefix('$').unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|option| option.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| ODataError::UnsupportedQueryOption {
                option: name.to_string(),
            })
    }
}

/// One `$expand` entry with its own nested options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expand {
    pub name: String,
    pub options: QueryOptions,
}

impl Expand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: QueryOptions::default(),
        }
    }

    pub fn with(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    fn render(&self, version: Version) -> String {
        let nested = self.options.render(version, ";");
        if nested.is_empty() {
            self.name.clone()
        } else {
            format!("{}({})", self.name, nested)
        }
    }
}

/// Typed query option mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    select: Vec<String>,
    expand: Vec<Expand>,
    filter: Option<String>,
    orderby: Option<String>,
    top: Option<u64>,
    skip: Option<u64>,
    search: Option<String>,
    count: Option<bool>,
    format: Option<String>,
    custom: BTreeMap<String, String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn expand(mut self, expand: Expand) -> Self {
        match self.expand.iter_mut().find(|e| e.name == expand.name) {
            Some(existing) => *existing = expand,
            None => self.expand.push(expand),
        }
        self
    }

    /// Expand navigation paths like `Trips.PlanItems.ConfirmationCode`
    pub fn expand_paths<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = ExpandTree::new();
        for path in paths {
            tree.add_path(path.as_ref());
        }
        tree.into_expands()
            .into_iter()
            .fold(self, |options, expand| options.expand(expand))
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn orderby(mut self, orderby: impl Into<String>) -> Self {
        self.orderby = Some(orderby.into());
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn count(mut self, count: bool) -> Self {
        self.count = Some(count);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn custom(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(name.into(), value.into());
        self
    }

    /// Build from a JSON object such as `{"select": ["A", "B"], "top": 5}`
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| ODataError::mismatch("", "query option object", json))?;
        obj.iter()
            .try_fold(Self::default(), |options, (name, value)| options.set(name, value))
    }

    /// Set one option by name from its JSON form
    pub fn set(self, name: &str, value: &serde_json::Value) -> Result<Self> {
        let option = QueryOption::from_name(name)?;
        Ok(match option {
            QueryOption::Select => self.select(string_list(name, value)?),
            QueryOption::Expand => expand_from_json(value)?
                .into_iter()
                .fold(self, |options, expand| options.expand(expand)),
            QueryOption::Filter => self.filter(text(name, value)?),
            QueryOption::OrderBy => self.orderby(string_list(name, value)?.join(",")),
            QueryOption::Top => self.top(unsigned(name, value)?),
            QueryOption::Skip => self.skip(unsigned(name, value)?),
            QueryOption::Search => self.search(text(name, value)?),
            QueryOption::Count => match value {
                serde_json::Value::Bool(b) => self.count(*b),
                other => return Err(ODataError::mismatch(name, "boolean", other)),
            },
            QueryOption::Format => self.format(text(name, value)?),
            QueryOption::Custom => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| ODataError::mismatch(name, "object", value))?;
                obj.iter().fold(self, |options, (key, v)| match v {
                    serde_json::Value::String(s) => options.custom(key.as_str(), s.as_str()),
                    other => options.custom(key.as_str(), other.to_string()),
                })
            }
        })
    }

    /// Copy with only the listed options retained
    pub fn keep(&self, options: &[QueryOption]) -> Self {
        let mut kept = Self::default();
        for option in options {
            match option {
                QueryOption::Select => kept.select = self.select.clone(),
                QueryOption::Expand => kept.expand = self.expand.clone(),
                QueryOption::Filter => kept.filter = self.filter.clone(),
                QueryOption::OrderBy => kept.orderby = self.orderby.clone(),
                QueryOption::Top => kept.top = self.top,
                QueryOption::Skip => kept.skip = self.skip,
                QueryOption::Search => kept.search = self.search.clone(),
                QueryOption::Count => kept.count = self.count,
                QueryOption::Format => kept.format = self.format.clone(),
                QueryOption::Custom => kept.custom = self.custom.clone(),
            }
        }
        kept
    }

    pub fn clear(&self) -> Self {
        Self::default()
    }

    /// True when nothing would be rendered
    pub fn is_empty(&self) -> bool {
        self.render(Version::V4, "&").is_empty()
    }

    pub fn selected(&self) -> &[String] {
        &self.select
    }

    pub fn expanded(&self) -> &[Expand] {
        &self.expand
    }

    pub fn top_value(&self) -> Option<u64> {
        self.top
    }

    /// Query string for protocol 4.0; `""` when nothing is set
    pub fn to_query_string(&self) -> String {
        self.render(Version::V4, "&")
    }

    /// Query string using the count spelling of `version`
    pub fn to_query_string_for(&self, version: Version) -> String {
        self.render(version, "&")
    }

    fn render(&self, version: Version, separator: &str) -> String {
        let mut parts = Vec::new();
        let select: Vec<&str> = self
            .select
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        if !select.is_empty() {
            parts.push(format!("$select={}", select.join(",")));
        }
        if !self.expand.is_empty() {
            let expands: Vec<String> = self.expand.iter().map(|e| e.render(version)).collect();
            parts.push(format!("$expand={}", expands.join(",")));
        }
        if let Some(filter) = non_empty(&self.filter) {
            parts.push(format!("$filter={}", filter));
        }
        if let Some(orderby) = non_empty(&self.orderby) {
            parts.push(format!("$orderby={}", orderby));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={}", top));
        }
        if let Some(skip) = self.skip {
            parts.push(format!("$skip={}", skip));
        }
        if let Some(search) = non_empty(&self.search) {
            parts.push(format!("$search={}", search));
        }
        if let Some(count) = self.count {
            parts.push(match version {
                Version::V4 => format!("$count={}", count),
                Version::V2 | Version::V3 => {
                    format!("$inlinecount={}", if count { "allpages" } else { "none" })
                }
            });
        }
        if let Some(format) = non_empty(&self.format) {
            parts.push(format!("$format={}", format));
        }
        for (name, value) in self.custom.iter().filter(|(_, v)| !v.is_empty()) {
            parts.push(format!("{}={}", name, value));
        }
        parts.join(separator)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn text(name: &str, value: &serde_json::Value) -> Result<String> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ODataError::mismatch(name, "string", value))
}

fn unsigned(name: &str, value: &serde_json::Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| ODataError::mismatch(name, "non-negative integer", value))
}

/// A list of strings, or a single comma-separated string
fn string_list(name: &str, value: &serde_json::Value) -> Result<Vec<String>> {
    match value {
        serde_json::Value::String(s) => Ok(s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()),
        serde_json::Value::Array(items) => items.iter().map(|item| text(name, item)).collect(),
        other => Err(ODataError::mismatch(name, "string or list of strings", other)),
    }
}

/// `"A"`, `["A", "B"]` or `{"A": {"select": [..]}, "B": {}}`
fn expand_from_json(value: &serde_json::Value) -> Result<Vec<Expand>> {
    match value {
        serde_json::Value::Object(obj) => obj
            .iter()
            .map(|(name, nested)| {
                let options = match nested {
                    serde_json::Value::Null => QueryOptions::default(),
                    other => QueryOptions::from_json(other)?,
                };
                Ok(Expand::new(name.as_str()).with(options))
            })
            .collect(),
        other => Ok(string_list("expand", other)?.into_iter().map(Expand::new).collect()),
    }
}

/// Nested `$expand` options built from dotted navigation paths
///
/// `Trips.PlanItems.ConfirmationCode` and `Trips.Name` become
/// `Trips($select=Name;$expand=PlanItems($select=ConfirmationCode))`.
#[derive(Debug, Default)]
pub struct ExpandTree {
    nodes: BTreeMap<String, ExpandNode>,
}

#[derive(Debug, Default)]
struct ExpandNode {
    /// Fields selected at this level
    selects: BTreeSet<String>,
    children: BTreeMap<String, ExpandNode>,
}

impl ExpandTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dotted path; the last segment is a field selected on the
    /// navigation before it, and a bare name expands that navigation whole
    pub fn add_path(&mut self, path: &str) {
        let segments: Vec<&str> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        match segments.as_slice() {
            [] => {}
            [navigation] => {
                self.nodes.entry(navigation.to_string()).or_default();
            }
            [navigation @ .., target] => Self::add_to_node_map(&mut self.nodes, navigation, target),
        }
    }

    fn add_to_node_map(nodes: &mut BTreeMap<String, ExpandNode>, navigation: &[&str], target: &str) {
        let Some((first, rest)) = navigation.split_first() else {
            return;
        };
        let node = nodes.entry(first.to_string()).or_default();
        if rest.is_empty() {
            node.selects.insert(target.to_string());
        } else {
            Self::add_to_node_map(&mut node.children, rest, target);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn into_expands(self) -> Vec<Expand> {
        self.nodes
            .into_iter()
            .map(|(name, node)| Self::build_expand(name, node))
            .collect()
    }

    fn build_expand(name: String, node: ExpandNode) -> Expand {
        let mut options = QueryOptions::default();
        // A field that is also expanded is a navigation property, not a column
        let selects: Vec<String> = node
            .selects
            .into_iter()
            .filter(|s| !node.children.contains_key(s))
            .collect();
        if !selects.is_empty() {
            options = options.select(selects);
        }
        for (child, child_node) in node.children {
            options = options.expand(Self::build_expand(child, child_node));
        }
        Expand::new(name).with(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_options_render_nothing() {
        assert_eq!(QueryOptions::new().to_query_string(), "");
    }

    #[test]
    fn test_declared_key_order() {
        let options = QueryOptions::from_json(&json!({"top": 5, "select": ["A", "B"]})).unwrap();
        assert_eq!(options.to_query_string(), "$select=A,B&$top=5");

        let options = QueryOptions::new()
            .custom("sap-client", "100")
            .format("json")
            .count(true)
            .skip(10)
            .orderby("Name desc")
            .filter("Age gt 3");
        assert_eq!(
            options.to_query_string(),
            "$filter=Age gt 3&$orderby=Name desc&$skip=10&$count=true&$format=json&sap-client=100"
        );
    }

    #[test]
    fn test_nested_expand() {
        let options = QueryOptions::new().expand(
            Expand::new("Trips").with(
                QueryOptions::new()
                    .select(["Name", "Budget"])
                    .filter("Budget gt 1000")
                    .expand(Expand::new("PlanItems")),
            ),
        );
        assert_eq!(
            options.to_query_string(),
            "$expand=Trips($select=Name,Budget;$expand=PlanItems;$filter=Budget gt 1000)"
        );
    }

    #[test]
    fn test_expand_from_json_object() {
        let options = QueryOptions::from_json(&json!({
            "expand": {"Friends": {"select": "UserName"}, "Photo": null}
        }))
        .unwrap();
        assert_eq!(options.to_query_string(), "$expand=Friends($select=UserName),Photo");
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(matches!(
            QueryOptions::from_json(&json!({"levels": 2})),
            Err(ODataError::UnsupportedQueryOption { .. })
        ));
        assert!(QueryOptions::from_json(&json!({"top": "five"})).is_err());
    }

    #[test]
    fn test_count_spelling_per_version() {
        let options = QueryOptions::new().count(true);
        assert_eq!(options.to_query_string_for(Version::V4), "$count=true");
        assert_eq!(options.to_query_string_for(Version::V2), "$inlinecount=allpages");
    }

    #[test]
    fn test_keep_and_clear() {
        let options = QueryOptions::new().select(["A"]).format("json").top(3);
        assert_eq!(options.keep(&[QueryOption::Format]).to_query_string(), "$format=json");
        assert!(options.clear().is_empty());
        assert_eq!(options.to_query_string(), "$select=A&$top=3&$format=json");
    }

    #[test]
    fn test_expand_tree_paths() {
        let options = QueryOptions::new().expand_paths([
            "Trips.PlanItems.ConfirmationCode",
            "Trips.Name",
            "Friends.UserName",
        ]);
        assert_eq!(
            options.to_query_string(),
            "$expand=Friends($select=UserName),Trips($select=Name;$expand=PlanItems($select=ConfirmationCode))"
        );
    }

    #[test]
    fn test_expand_tree_bare_navigation() {
        assert_eq!(
            QueryOptions::new().expand_paths(["Trips"]).to_query_string(),
            "$expand=Trips"
        );
        assert_eq!(
            QueryOptions::new()
                .expand_paths(["Trips", "Friends", "Friends.UserName"])
                .to_query_string(),
            "$expand=Friends($select=UserName),Trips"
        );
    }

    #[test]
    fn test_empty_text_options_are_skipped() {
        let options = QueryOptions::new()
            .filter("")
            .search("")
            .orderby("")
            .format("")
            .select([""])
            .custom("sap-client", "");
        assert_eq!(options.to_query_string(), "");
        assert!(options.is_empty());
        assert_eq!(options.filter("Age gt 3").to_query_string(), "$filter=Age gt 3");
    }

    #[test]
    fn test_expand_tree_navigation_selected_and_expanded() {
        let mut tree = ExpandTree::new();
        tree.add_path("Trips.PlanItems");
        tree.add_path("Trips.PlanItems.Duration");
        let expands = tree.into_expands();
        assert_eq!(expands.len(), 1);
        assert_eq!(
            QueryOptions::new().expand(expands[0].clone()).to_query_string(),
            "$expand=Trips($expand=PlanItems($select=Duration))"
        );
    }
}
