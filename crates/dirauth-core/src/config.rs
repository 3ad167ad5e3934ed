//! Configuration for Dirauth
//!
//! Example:
//! ```toml
//! [directory]
//! provider_type = "AD"
//! url = "ldaps://dc.example.com:636"
//! base_dn = "dc=example,dc=com"
//! users_location = "ou=People,"
//! groups_location = "ou=Groups,"
//!
//! [directory.domain]
//! domain_suffix = "example.com"
//! anonymous_bind_identity = "svc-lookup@example.com"
//! anonymous_bind_credential = "secret"
//!
//! [groups]
//! SCHED_ADMIN = "Admins"
//! SCHED_USER = "Users"
//! ```

use crate::types::{
    group_attribute_of, BindIdentity, DomainSettings, GroupCatalog, LegacySettings,
    OverrideCredentials, ProviderConfig, ProviderKind, ProviderType, SessionOptions,
    DEFAULT_REQUESTED_ATTRIBUTES,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Environment prefix for catalog entries (`DIRAUTH_GROUP_SCHED_ADMIN=Admins`)
pub const GROUP_ENV_PREFIX: &str = "DIRAUTH_GROUP_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirAuthConfig {
    #[serde(default)]
    pub directory: DirectorySection,

    #[serde(default, rename = "override")]
    pub override_section: OverrideSection,

    /// Group key -> directory group name
    #[serde(default)]
    pub groups: BTreeMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirAuthConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigInvalid(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::ConfigInvalid(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(std::env::vars());
        config
    }

    /// Overlay `DIRAUTH_*` variables onto this configuration
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(group_key) = key.strip_prefix(GROUP_ENV_PREFIX) {
                if !group_key.is_empty() {
                    debug!("Group {} taken from environment", group_key);
                    self.groups.insert(group_key.to_string(), value);
                }
                continue;
            }

            match key.as_str() {
                "DIRAUTH_PROVIDER_TYPE" => self.directory.provider_type = value,
                "DIRAUTH_URL" => self.directory.url = value,
                "DIRAUTH_BASE_DN" => self.directory.base_dn = value,
                "DIRAUTH_USERS_LOC" => self.directory.users_location = value,
                "DIRAUTH_GROUPS_LOC" => self.directory.groups_location = value,
                "DIRAUTH_DOMAIN" => self.directory.domain.domain_suffix = value,
                "DIRAUTH_ANON_BIND_IDENTITY" => {
                    self.directory.domain.anonymous_bind_identity = value
                }
                "DIRAUTH_ANON_BIND_CREDENTIAL" => {
                    self.directory.domain.anonymous_bind_credential = value
                }
                "DIRAUTH_TIMEOUT_SECONDS" => {
                    if let Ok(secs) = value.parse() {
                        self.directory.timeout_seconds = secs;
                    }
                }
                "DIRAUTH_OVERRIDE" => {
                    self.override_section.enabled = value.trim().eq_ignore_ascii_case("true")
                }
                "DIRAUTH_OVERRIDE_IDENTITY" => self.override_section.identity = Some(value),
                "DIRAUTH_OVERRIDE_CREDENTIAL" => self.override_section.credential = Some(value),
                "DIRAUTH_LOG_LEVEL" => self.logging.level = value,
                "DIRAUTH_LOG_FORMAT" => self.logging.format = value,
                _ => {}
            }
        }
    }

    /// Validate and freeze the provider settings
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let directory = &self.directory;
        let provider_type: ProviderType = directory.provider_type.parse()?;

        validate_url(&directory.url)?;
        if directory.base_dn.trim().is_empty() {
            return Err(Error::ConfigInvalid("Base DN is required".into()));
        }

        let kind = match provider_type {
            ProviderType::DomainDirectory => {
                ProviderKind::DomainDirectory(directory.domain.validate()?)
            }
            ProviderType::LegacyDirectory => ProviderKind::LegacyDirectory(
                directory.legacy.validate(&directory.groups_location)?,
            ),
        };

        Ok(ProviderConfig {
            url: directory.url.clone(),
            base_dn: directory.base_dn.clone(),
            users_location: directory.users_location.clone(),
            groups_location: directory.groups_location.clone(),
            kind,
            override_credentials: self.override_section.validate()?,
            session: SessionOptions {
                timeout: Duration::from_secs(directory.timeout_seconds),
                start_tls: directory.start_tls,
                skip_tls_verify: directory.skip_tls_verify,
            },
        })
    }

    pub fn group_catalog(&self) -> Result<GroupCatalog> {
        GroupCatalog::new(self.groups.clone())
    }
}

fn validate_url(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(Error::ConfigInvalid("Directory URL is required".into()));
    }

    let url = url::Url::parse(raw)
        .map_err(|e| Error::ConfigInvalid(format!("Invalid directory URL {}: {}", raw, e)))?;

    match url.scheme() {
        "ldap" | "ldaps" => Ok(()),
        other => Err(Error::ConfigInvalid(format!(
            "Directory URL must start with ldap:// or ldaps://, got {}://",
            other
        ))),
    }
}

/// Directory connection and layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySection {
    /// AD / LDAP (aliases: domain_directory, legacy_directory)
    #[serde(default = "default_provider_type")]
    pub provider_type: String,

    /// Directory URL (ldap:// or ldaps://)
    #[serde(default = "default_url")]
    pub url: String,

    /// Base DN appended to every location
    #[serde(default)]
    pub base_dn: String,

    /// Users location, relative to the base DN (e.g. "ou=People,")
    #[serde(default)]
    pub users_location: String,

    /// Groups location, relative to the base DN (e.g. "cn=groups,")
    #[serde(default)]
    pub groups_location: String,

    /// Connect/bind/search timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Use STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub skip_tls_verify: bool,

    #[serde(default)]
    pub domain: DomainSection,

    #[serde(default)]
    pub legacy: LegacySection,
}

fn default_provider_type() -> String {
    "AD".to_string()
}

fn default_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    crate::DEFAULT_TIMEOUT_SECS
}

impl Default for DirectorySection {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            url: default_url(),
            base_dn: String::new(),
            users_location: String::new(),
            groups_location: String::new(),
            timeout_seconds: default_timeout(),
            start_tls: false,
            skip_tls_verify: false,
            domain: DomainSection::default(),
            legacy: LegacySection::default(),
        }
    }
}

/// Domain-directory-only settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSection {
    /// Appended to usernames as `user@domain_suffix`
    #[serde(default)]
    pub domain_suffix: String,

    /// Identity used to bind for token lookups
    #[serde(default)]
    pub anonymous_bind_identity: String,

    #[serde(default)]
    pub anonymous_bind_credential: String,

    /// Attribute holding the token identifier
    #[serde(default = "default_token_attr")]
    pub token_attribute: String,

    /// Attribute holding the login name
    #[serde(default = "default_username_attr")]
    pub username_attribute: String,

    /// Attributes read from each matching user entry
    #[serde(default = "default_requested_attributes")]
    pub requested_attributes: Vec<String>,
}

fn default_token_attr() -> String {
    "serialNumber".to_string()
}

fn default_username_attr() -> String {
    "sAMAccountName".to_string()
}

fn default_requested_attributes() -> Vec<String> {
    DEFAULT_REQUESTED_ATTRIBUTES
        .iter()
        .map(|a| a.to_string())
        .collect()
}

impl Default for DomainSection {
    fn default() -> Self {
        Self {
            domain_suffix: String::new(),
            anonymous_bind_identity: String::new(),
            anonymous_bind_credential: String::new(),
            token_attribute: default_token_attr(),
            username_attribute: default_username_attr(),
            requested_attributes: default_requested_attributes(),
        }
    }
}

impl DomainSection {
    fn validate(&self) -> Result<DomainSettings> {
        if self.domain_suffix.trim().is_empty() {
            return Err(Error::ConfigInvalid("Domain suffix is required".into()));
        }
        if self.anonymous_bind_identity.is_empty() || self.anonymous_bind_credential.is_empty() {
            return Err(Error::ConfigInvalid(
                "Anonymous bind identity and credential are required".into(),
            ));
        }
        if self.token_attribute.is_empty() || self.username_attribute.is_empty() {
            return Err(Error::ConfigInvalid(
                "Token and username attributes are required".into(),
            ));
        }
        if self.requested_attributes.is_empty() {
            return Err(Error::ConfigInvalid(
                "At least one requested attribute is required".into(),
            ));
        }

        Ok(DomainSettings {
            domain_suffix: self.domain_suffix.clone(),
            anonymous_bind: BindIdentity::new(
                self.anonymous_bind_identity.clone(),
                self.anonymous_bind_credential.clone(),
            ),
            token_attribute: self.token_attribute.clone(),
            username_attribute: self.username_attribute.clone(),
            requested_attributes: self.requested_attributes.clone(),
        })
    }
}

/// Legacy-directory-only settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySection {
    /// Group attribute listing member user ids
    #[serde(default = "default_member_attr")]
    pub member_attribute: String,
}

fn default_member_attr() -> String {
    "memberUid".to_string()
}

impl Default for LegacySection {
    fn default() -> Self {
        Self {
            member_attribute: default_member_attr(),
        }
    }
}

impl LegacySection {
    fn validate(&self, groups_location: &str) -> Result<LegacySettings> {
        let group_attribute = group_attribute_of(groups_location).ok_or_else(|| {
            Error::ConfigInvalid(format!(
                "Groups location must start with an attribute prefix such as cn=, got {:?}",
                groups_location
            ))
        })?;

        if self.member_attribute.is_empty() {
            return Err(Error::ConfigInvalid("Member attribute is required".into()));
        }

        Ok(LegacySettings {
            group_attribute: group_attribute.to_string(),
            member_attribute: self.member_attribute.clone(),
        })
    }
}

/// Break-glass local identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub identity: Option<String>,

    #[serde(default)]
    pub credential: Option<String>,
}

impl OverrideSection {
    fn validate(&self) -> Result<Option<OverrideCredentials>> {
        if !self.enabled {
            return Ok(None);
        }

        match (&self.identity, &self.credential) {
            (Some(identity), Some(credential)) if !identity.is_empty() && !credential.is_empty() => {
                Ok(Some(OverrideCredentials {
                    identity: identity.clone(),
                    credential: credential.clone(),
                }))
            }
            _ => Err(Error::ConfigInvalid(
                "Override enabled but identity or credential not specified".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
