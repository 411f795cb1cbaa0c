//! Case-insensitive header access over whatever the transport hands us

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Protocol version headers, 4.0 first
pub const VERSION_HEADERS: [&str; 2] = ["OData-Version", "DataServiceVersion"];

pub const CONTENT_TYPE: &str = "Content-Type";
pub const ETAG: &str = "ETag";

/// Header lookup by name, ignoring ASCII case
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;

    /// First of `names` that is present
    fn first_header(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.header(name))
    }
}

fn find_case_insensitive<'a, K, V, I>(entries: I, name: &str) -> Option<&'a str>
where
    K: AsRef<str> + 'a,
    V: AsRef<str> + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    entries
        .into_iter()
        .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_ref())
}

impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(String::as_str)
            .or_else(|| find_case_insensitive(self.iter(), name))
    }
}

impl HeaderLookup for BTreeMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(String::as_str)
            .or_else(|| find_case_insensitive(self.iter(), name))
    }
}

impl HeaderLookup for Vec<(String, String)> {
    fn header(&self, name: &str) -> Option<&str> {
        find_case_insensitive(self.iter().map(|(k, v)| (k, v)), name)
    }
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

/// Parse a raw `Name: value` header line
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
