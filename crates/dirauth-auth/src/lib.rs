//! Directory authentication for Dirauth
//!
//! Verifies a presented credential against a domain directory or a legacy
//! directory and reports group-membership flags for the authorization layer.

pub mod authenticator;
pub mod directory;
pub mod mapper;
pub mod resolver;
pub mod strategy;
pub mod trail;

#[cfg(test)]
mod testing;

pub use authenticator::Authenticator;
pub use directory::{
    DirectoryGateway, LdapGateway, LdapSession, SearchFilter, SearchRequest, SearchScope,
};
pub use resolver::resolve_bind_identity;
pub use strategy::{DirectoryStrategy, DomainDirectory, LegacyDirectory};
pub use trail::{Diagnostics, ErrorTrail, TrailScope};
