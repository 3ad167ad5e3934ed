//! Validated provider settings
//!
//! Built once at startup from the configuration file (see
//! [`crate::DirAuthConfig::provider_config`]) and shared read-only afterwards.

use crate::types::BindIdentity;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Attributes read from a domain-directory user entry when none are configured.
pub const DEFAULT_REQUESTED_ATTRIBUTES: &[&str] = &[
    "cn",
    "memberOf",
    "givenName",
    "name",
    "sn",
    "sAMAccountName",
    "serialNumber",
];

/// Directory provider mode, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Domain directory (Active Directory style, `user@domain` binds)
    DomainDirectory,
    /// Legacy directory (`uid=` DN binds, per-group memberUid lookups)
    LegacyDirectory,
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ad" | "active_directory" | "domain" | "domain_directory" => {
                Ok(ProviderType::DomainDirectory)
            }
            "ldap" | "legacy" | "legacy_directory" => Ok(ProviderType::LegacyDirectory),
            _ => Err(Error::UnsupportedProviderKind(s.to_string())),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::DomainDirectory => write!(f, "AD"),
            ProviderType::LegacyDirectory => write!(f, "LDAP"),
        }
    }
}

/// Settings only the domain-directory mode reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSettings {
    /// Suffix appended as `username@suffix` to form the bind identity
    pub domain_suffix: String,
    /// Shared identity used to bind when a token is presented
    pub anonymous_bind: BindIdentity,
    /// Attribute holding the token identifier on user entries
    pub token_attribute: String,
    /// Attribute holding the login name on user entries
    pub username_attribute: String,
    /// Attributes read from each matching user entry
    pub requested_attributes: Vec<String>,
}

/// Settings only the legacy-directory mode reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySettings {
    /// Attribute naming a group, taken from the groups location prefix (`cn`, `ou`)
    pub group_attribute: String,
    /// Attribute listing member user ids on a group entry
    pub member_attribute: String,
}

/// Exactly one provider mode is active; the other mode's settings do not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    DomainDirectory(DomainSettings),
    LegacyDirectory(LegacySettings),
}

impl ProviderKind {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderKind::DomainDirectory(_) => ProviderType::DomainDirectory,
            ProviderKind::LegacyDirectory(_) => ProviderType::LegacyDirectory,
        }
    }
}

/// Local identity that bypasses the directory entirely.
#[derive(Clone, PartialEq, Eq)]
pub struct OverrideCredentials {
    pub identity: String,
    pub credential: String,
}

impl OverrideCredentials {
    /// Exact comparison against the configured pair
    pub fn matches(&self, identity: &str, credential: &str) -> bool {
        self.identity == identity && self.credential == credential
    }
}

impl fmt::Debug for OverrideCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverrideCredentials")
            .field("identity", &self.identity)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Connection options handed to the directory gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Applied to connect, bind and every search
    pub timeout: Duration,
    pub start_tls: bool,
    pub skip_tls_verify: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT_SECS),
            start_tls: false,
            skip_tls_verify: false,
        }
    }
}

/// Immutable, validated settings for the active provider mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Directory URL (ldap:// or ldaps://)
    pub url: String,
    /// Base DN every location is appended to
    /// Example: "dc=example,dc=com"
    pub base_dn: String,
    /// Users location relative to the base DN, trailing comma included
    /// Example: "ou=People,"
    pub users_location: String,
    /// Groups location relative to the base DN, trailing comma included
    pub groups_location: String,
    pub kind: ProviderKind,
    /// Present only when override mode is enabled
    pub override_credentials: Option<OverrideCredentials>,
    pub session: SessionOptions,
}

impl ProviderConfig {
    pub fn provider_type(&self) -> ProviderType {
        self.kind.provider_type()
    }

    /// Search base for user entries
    pub fn users_base(&self) -> String {
        format!("{}{}", self.users_location, self.base_dn)
    }

    /// Search base for group entries
    pub fn groups_base(&self) -> String {
        format!("{}{}", self.groups_location, self.base_dn)
    }

    pub fn override_enabled(&self) -> bool {
        self.override_credentials.is_some()
    }
}

/// Attribute naming groups under a groups location: the text before its first `=`.
pub fn group_attribute_of(groups_location: &str) -> Option<&str> {
    groups_location
        .split_once('=')
        .map(|(attr, _)| attr.trim())
        .filter(|attr| !attr.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!("AD".parse::<ProviderType>().unwrap(), ProviderType::DomainDirectory);
        assert_eq!("ldap".parse::<ProviderType>().unwrap(), ProviderType::LegacyDirectory);
        assert_eq!(
            "Domain_Directory".parse::<ProviderType>().unwrap(),
            ProviderType::DomainDirectory
        );
        assert!(matches!(
            "NIS".parse::<ProviderType>(),
            Err(Error::UnsupportedProviderKind(_))
        ));
    }

    #[test]
    fn test_group_attribute_derivation() {
        assert_eq!(group_attribute_of("cn=groups,"), Some("cn"));
        assert_eq!(group_attribute_of("ou=Group,ou=Unix,"), Some("ou"));
        assert_eq!(group_attribute_of("groups"), None);
        assert_eq!(group_attribute_of("=groups,"), None);
    }

    #[test]
    fn test_override_matches_exactly() {
        let creds = OverrideCredentials {
            identity: "breakglass".into(),
            credential: "s3cret".into(),
        };
        assert!(creds.matches("breakglass", "s3cret"));
        assert!(!creds.matches("BreakGlass", "s3cret"));
        assert!(!creds.matches("breakglass", "s3cret "));
        assert!(!format!("{:?}", creds).contains("s3cret"));
    }
}
