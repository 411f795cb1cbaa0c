//! Resource path segments and URL literal encoding
//!
//! A path like `People('russellwhyte')/Trips(1003)/PlanItems/$count` is an
//! ordered list of typed segments. Keys render as `(<literal>)` glued to the
//! segment they address.

use std::fmt;

use crate::edm::Version;
use crate::error::{ODataError, Result};

/// A primitive or enum value in URL literal form
///
/// `Display` gives the readable 4.0 literal (`'O''Neil'`); [`Literal::render_for`]
/// uses the prefixed 2.0/3.0 forms (`guid'..'`, `datetime'..'`) where they
/// differ, and [`Literal::to_url_for`] additionally percent-encodes free text
/// for use inside a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    /// Decimal number kept in its written form
    Decimal(String),
    String(String),
    Guid(String),
    Date(String),
    /// 2.0/3.0 `Edm.DateTime`
    DateTime(String),
    TimeOfDay(String),
    DateTimeOffset(String),
    Duration(String),
    Binary(String),
    Enum { type_name: String, members: String },
}

impl Literal {
    /// 4.0 literal with string and enum content percent-encoded
    pub fn to_url(&self) -> String {
        self.to_url_for(Version::V4)
    }

    pub fn to_url_for(&self, version: Version) -> String {
        match self {
            Literal::String(s) => format!("'{}'", urlencoding::encode(&s.replace('\'', "''"))),
            Literal::Enum { type_name, members } => {
                format!("{}'{}'", type_name, urlencoding::encode(members))
            }
            // Offsets may carry a '+'
            Literal::DateTimeOffset(_) | Literal::DateTime(_) => {
                self.render_for(version).replace('+', "%2B")
            }
            other => other.render_for(version),
        }
    }

    /// Readable literal in the grammar of `version`
    pub fn render_for(&self, version: Version) -> String {
        let legacy = version != Version::V4;
        match self {
            Literal::Null => "null".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(x) if x.is_nan() => "NaN".to_string(),
            Literal::Float(x) if x.is_infinite() => {
                let text = if *x > 0.0 { "INF" } else { "-INF" };
                text.to_string()
            }
            Literal::Float(x) => x.to_string(),
            Literal::Decimal(s) if legacy => format!("{}M", s),
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Guid(s) if legacy => format!("guid'{}'", s),
            Literal::DateTime(s) if legacy => format!("datetime'{}'", s),
            Literal::DateTimeOffset(s) if legacy => format!("datetimeoffset'{}'", s),
            Literal::Duration(s) if legacy => format!("time'{}'", s),
            Literal::Decimal(s)
            | Literal::Guid(s)
            | Literal::Date(s)
            | Literal::DateTime(s)
            | Literal::TimeOfDay(s)
            | Literal::DateTimeOffset(s) => s.clone(),
            Literal::Duration(s) => format!("duration'{}'", s),
            Literal::Binary(s) => format!("binary'{}'", s),
            Literal::Enum { type_name, members } => format!("{}'{}'", type_name, members),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_for(Version::V4))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

/// Key predicate: a single value or named parts of a composite key
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Single(Literal),
    Composite(Vec<(String, Literal)>),
}

impl KeyValue {
    fn to_url_for(&self, version: Version) -> String {
        match self {
            KeyValue::Single(literal) => literal.to_url_for(version),
            KeyValue::Composite(parts) => render_pairs(parts, |l| l.to_url_for(version)),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Single(literal) => write!(f, "{}", literal),
            KeyValue::Composite(parts) => write!(f, "{}", render_pairs(parts, Literal::to_string)),
        }
    }
}

impl From<Literal> for KeyValue {
    fn from(value: Literal) -> Self {
        KeyValue::Single(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Single(value.into())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Single(value.into())
    }
}

fn render_pairs(parts: &[(String, Literal)], render: impl Fn(&Literal) -> String) -> String {
    parts
        .iter()
        .map(|(name, literal)| format!("{}={}", name, render(literal)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    EntitySet,
    Singleton,
    Key,
    NavigationProperty,
    Property,
    Action,
    Function,
    Value,
    Count,
    Ref,
}

impl SegmentKind {
    fn is_terminal(self) -> bool {
        matches!(self, SegmentKind::Value | SegmentKind::Count | SegmentKind::Ref)
    }

    fn can_start(self) -> bool {
        matches!(
            self,
            SegmentKind::EntitySet | SegmentKind::Singleton | SegmentKind::Action | SegmentKind::Function
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    EntitySet(String),
    Singleton(String),
    Key(KeyValue),
    NavigationProperty(String),
    Property(String),
    Action(String),
    Function {
        name: String,
        parameters: Vec<(String, Literal)>,
    },
    Value,
    Count,
    Ref,
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::EntitySet(_) => SegmentKind::EntitySet,
            Segment::Singleton(_) => SegmentKind::Singleton,
            Segment::Key(_) => SegmentKind::Key,
            Segment::NavigationProperty(_) => SegmentKind::NavigationProperty,
            Segment::Property(_) => SegmentKind::Property,
            Segment::Action(_) => SegmentKind::Action,
            Segment::Function { .. } => SegmentKind::Function,
            Segment::Value => SegmentKind::Value,
            Segment::Count => SegmentKind::Count,
            Segment::Ref => SegmentKind::Ref,
        }
    }

    fn render(&self, version: Version) -> String {
        match self {
            Segment::EntitySet(name)
            | Segment::Singleton(name)
            | Segment::NavigationProperty(name)
            | Segment::Property(name)
            | Segment::Action(name) => name.clone(),
            Segment::Function { name, parameters } => {
                format!("{}({})", name, render_pairs(parameters, |l| l.to_url_for(version)))
            }
            Segment::Key(key) => format!("({})", key.to_url_for(version)),
            Segment::Value => "$value".to_string(),
            Segment::Count => "$count".to_string(),
            Segment::Ref => "$ref".to_string(),
        }
    }
}

/// Immutable, structurally valid segment sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePath {
    segments: Vec<Segment>,
}

impl ResourcePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// New path with `segment` appended; `self` is left untouched
    pub fn append(&self, segment: Segment) -> Result<Self> {
        let kind = segment.kind();
        match self.segments.last().map(Segment::kind) {
            None if !kind.can_start() => {
                return Err(ODataError::invalid_path(format!(
                    "a path cannot start with a {:?} segment",
                    kind
                )));
            }
            Some(previous) if previous.is_terminal() => {
                return Err(ODataError::invalid_path(format!(
                    "nothing may follow {}",
                    self.segments
                        .last()
                        .map(|s| s.render(Version::V4))
                        .unwrap_or_default()
                )));
            }
            Some(_) if matches!(kind, SegmentKind::EntitySet | SegmentKind::Singleton) => {
                return Err(ODataError::invalid_path(format!(
                    "{:?} segment must be the first segment",
                    kind
                )));
            }
            Some(previous)
                if kind == SegmentKind::Key
                    && !matches!(previous, SegmentKind::EntitySet | SegmentKind::NavigationProperty) =>
            {
                return Err(ODataError::invalid_path(format!(
                    "a key may only follow an entity set or navigation property, not {:?}",
                    previous
                )));
            }
            _ => {}
        }

        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// Key predicate of the last segment, if it is one
    pub fn key(&self) -> Option<&KeyValue> {
        match self.segments.last() {
            Some(Segment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Render as a relative 4.0 URL path
    pub fn to_path(&self) -> String {
        self.to_path_for(Version::V4)
    }

    /// Render as a relative URL path with the literal grammar of `version`
    pub fn to_path_for(&self, version: Version) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match (segment, parts.last_mut()) {
                (Segment::Key(_), Some(previous)) => previous.push_str(&segment.render(version)),
                _ => parts.push(segment.render(version)),
            }
        }
        parts.join("/")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> ResourcePath {
        ResourcePath::new()
            .append(Segment::EntitySet("People".into()))
            .unwrap()
    }

    #[test]
    fn test_key_glued_to_previous_segment() {
        let path = people()
            .append(Segment::Key("russellwhyte".into()))
            .unwrap()
            .append(Segment::NavigationProperty("Trips".into()))
            .unwrap()
            .append(Segment::Key(1003i64.into()))
            .unwrap()
            .append(Segment::NavigationProperty("PlanItems".into()))
            .unwrap()
            .append(Segment::Count)
            .unwrap();
        assert_eq!(path.to_path(), "People('russellwhyte')/Trips(1003)/PlanItems/$count");
    }

    #[test]
    fn test_append_leaves_original_untouched() {
        let base = people();
        let keyed = base.append(Segment::Key("x".into())).unwrap();
        assert_eq!(base.to_path(), "People");
        assert_eq!(keyed.to_path(), "People('x')");
    }

    #[test]
    fn test_key_placement_rules() {
        let keyed = people().append(Segment::Key("x".into())).unwrap();
        assert!(matches!(
            keyed.append(Segment::Key("y".into())),
            Err(ODataError::InvalidPath { .. })
        ));
        let property = keyed.append(Segment::Property("FirstName".into())).unwrap();
        assert!(property.append(Segment::Key("y".into())).is_err());
        assert!(ResourcePath::new().append(Segment::Key("y".into())).is_err());
    }

    #[test]
    fn test_terminal_and_leading_segments() {
        let counted = people().append(Segment::Count).unwrap();
        assert!(counted.append(Segment::Property("x".into())).is_err());
        assert!(ResourcePath::new().append(Segment::Property("x".into())).is_err());
        assert!(people().append(Segment::EntitySet("Airlines".into())).is_err());
        assert!(
            ResourcePath::new()
                .append(Segment::Singleton("Me".into()))
                .is_ok()
        );
    }

    #[test]
    fn test_composite_key_and_function_parameters() {
        let path = ResourcePath::new()
            .append(Segment::EntitySet("Trips".into()))
            .unwrap()
            .append(Segment::Key(KeyValue::Composite(vec![
                ("PersonName".into(), "russellwhyte".into()),
                ("TripId".into(), Literal::Int(1003)),
            ])))
            .unwrap();
        assert_eq!(path.to_path(), "Trips(PersonName='russellwhyte',TripId=1003)");

        let function = ResourcePath::new()
            .append(Segment::Function {
                name: "GetNearestAirport".into(),
                parameters: vec![
                    ("lat".into(), Literal::Float(33.0)),
                    ("lon".into(), Literal::Float(-118.5)),
                ],
            })
            .unwrap();
        assert_eq!(function.to_path(), "GetNearestAirport(lat=33,lon=-118.5)");
    }

    #[test]
    fn test_literal_forms() {
        assert_eq!(Literal::String("O'Neil".into()).to_string(), "'O''Neil'");
        assert_eq!(Literal::String("New York".into()).to_url(), "'New%20York'");
        assert_eq!(Literal::Duration("PT12H".into()).to_string(), "duration'PT12H'");
        assert_eq!(Literal::Binary("T0RhdGE=".into()).to_string(), "binary'T0RhdGE='");
        assert_eq!(Literal::Null.to_string(), "null");
        assert_eq!(Literal::Boolean(true).to_string(), "true");
        assert_eq!(
            Literal::DateTimeOffset("2012-12-03T07:16:23+01:00".into()).to_url(),
            "2012-12-03T07:16:23%2B01:00"
        );
    }

    #[test]
    fn test_legacy_literal_prefixes() {
        let guid = Literal::Guid("01234567-89ab-cdef-0123-456789abcdef".into());
        assert_eq!(guid.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(
            guid.render_for(Version::V2),
            "guid'01234567-89ab-cdef-0123-456789abcdef'"
        );
        assert_eq!(
            Literal::DateTime("2012-12-03T07:16:23".into()).render_for(Version::V3),
            "datetime'2012-12-03T07:16:23'"
        );
        assert_eq!(
            Literal::DateTimeOffset("2012-12-03T07:16:23+01:00".into()).to_url_for(Version::V3),
            "datetimeoffset'2012-12-03T07:16:23%2B01:00'"
        );
        assert_eq!(Literal::Duration("PT12H".into()).render_for(Version::V2), "time'PT12H'");
        assert_eq!(Literal::Decimal("1.10".into()).render_for(Version::V2), "1.10M");
        assert_eq!(Literal::Decimal("1.10".into()).to_string(), "1.10");

        let path = ResourcePath::new()
            .append(Segment::EntitySet("Orders".into()))
            .unwrap()
            .append(Segment::Key(KeyValue::Single(guid)))
            .unwrap();
        assert_eq!(
            path.to_path_for(Version::V2),
            "Orders(guid'01234567-89ab-cdef-0123-456789abcdef')"
        );
        assert_eq!(path.to_path(), "Orders(01234567-89ab-cdef-0123-456789abcdef)");
    }

    #[test]
    fn test_ref_segment() {
        let path = people()
            .append(Segment::Key("russellwhyte".into()))
            .unwrap()
            .append(Segment::NavigationProperty("Friends".into()))
            .unwrap()
            .append(Segment::Ref)
            .unwrap();
        assert_eq!(path.to_string(), "People('russellwhyte')/Friends/$ref");
    }
}
