//! Dirauth Core Library
//!
//! Core types, configuration and errors for directory-backed authentication.

pub mod config;
pub mod error;
pub mod types;

pub use config::DirAuthConfig;
pub use error::{Error, Result};
pub use types::{
    AuthenticationResult, BindIdentity, Credential, DirectoryEntry, DomainSettings, GroupCatalog,
    LegacySettings, OverrideCredentials, ProviderConfig, ProviderKind, SessionOptions,
};

/// Dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix every catalog group name is matched behind in domain mode
pub const GROUP_RDN_PREFIX: &str = "cn=";

/// Default directory operation timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Result key carrying the overall authentication flag in the flat view
pub const AUTHENTICATED_KEY: &str = "authenticated";

/// Result key carrying the echoed token identifier in the flat view
pub const TOKEN_ID_KEY: &str = "keyfob_id";
