//! Authentication result handed to the authorization layer

use crate::types::GroupCatalog;
use crate::{AUTHENTICATED_KEY, TOKEN_ID_KEY};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Outcome of one authentication call.
///
/// Once returned by the authenticator, `groups` holds every catalog key.
/// Error detail is never carried here; it is exposed through diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    pub authenticated: bool,

    /// Group key -> membership flag
    pub groups: BTreeMap<String, bool>,

    /// Token identifier echoed back when the subject was found by token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,

    /// First value seen per attribute name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl AuthenticationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a group as held
    pub fn grant(&mut self, key: &str) {
        self.groups.insert(key.to_string(), true);
    }

    /// Flag every catalog group as held
    pub fn grant_all(&mut self, catalog: &GroupCatalog) {
        for key in catalog.keys() {
            self.grant(key);
        }
    }

    /// Set every catalog key not yet decided to `false`
    pub fn complete(&mut self, catalog: &GroupCatalog) {
        for key in catalog.keys() {
            self.groups.entry(key.to_string()).or_insert(false);
        }
    }

    /// Record an attribute value unless that name was already surfaced
    pub fn surface_attribute(&mut self, name: &str, value: &str) {
        self.attributes
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }

    pub fn is_member(&self, key: &str) -> bool {
        self.groups.get(key).copied().unwrap_or(false)
    }

    /// Whether every catalog key has a flag
    pub fn is_total_over(&self, catalog: &GroupCatalog) -> bool {
        catalog.keys().all(|k| self.groups.contains_key(k))
    }

    /// Single-object view: group flags, `authenticated`, `keyfob_id` and
    /// surfaced attributes side by side.
    ///
    /// Group flags and the reserved keys win over attribute names on collision.
    pub fn to_flat_map(&self) -> Map<String, Value> {
        let mut map = Map::new();

        for (name, value) in &self.attributes {
            map.insert(name.clone(), Value::String(value.clone()));
        }
        for (key, member) in &self.groups {
            map.insert(key.clone(), Value::Bool(*member));
        }
        if let Some(token_id) = &self.token_id {
            map.insert(TOKEN_ID_KEY.to_string(), Value::String(token_id.clone()));
        }
        map.insert(AUTHENTICATED_KEY.to_string(), Value::Bool(self.authenticated));

        map
    }
}
