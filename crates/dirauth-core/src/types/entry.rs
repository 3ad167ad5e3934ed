//! Directory search results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single directory entry: its DN plus multi-valued attributes.
///
/// Attribute names keep the casing the directory returned them in; lookups
/// are case-insensitive, as directory attribute names are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished Name
    pub dn: String,

    /// Attribute name -> ordered values
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute insertion
    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Values of an attribute, matched case-insensitively
    pub fn attribute(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Get first value of an attribute
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.attribute(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Whether at least one of the named attributes carries a value
    pub fn has_any<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names
            .iter()
            .any(|n| self.attribute(n.as_ref()).is_some_and(|v| !v.is_empty()))
    }

    /// All values of an attribute joined as `v1, v2, ...`
    pub fn joined_values(&self, name: &str) -> Option<String> {
        self.attribute(name).map(|v| v.join(", "))
    }
}
