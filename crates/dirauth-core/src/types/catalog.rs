//! Group catalog: authorization keys mapped to directory group names

use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Immutable mapping from group key (meaningful to the authorization layer)
/// to the group name matched against the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GroupCatalog {
    groups: BTreeMap<String, String>,
}

impl GroupCatalog {
    /// Build a catalog, rejecting duplicate or empty keys and empty names.
    pub fn new<K, V, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut groups = BTreeMap::new();
        for (key, name) in entries {
            let key = key.into();
            let name = name.into();

            if key.trim().is_empty() {
                return Err(Error::ConfigInvalid("Group key must not be empty".into()));
            }
            if name.trim().is_empty() {
                return Err(Error::ConfigInvalid(format!(
                    "Group {} has an empty directory name",
                    key
                )));
            }
            if groups.insert(key.clone(), name).is_some() {
                return Err(Error::ConfigInvalid(format!("Duplicate group key: {}", key)));
            }
        }

        Ok(Self { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    /// Directory group name for a key
    pub fn name(&self, key: &str) -> Option<&str> {
        self.groups.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// `(key, group name)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
