//! Directory access
//!
//! [`DirectoryGateway`] is the seam the authenticator drives; [`LdapGateway`]
//! implements it over ldap3 with LDAP, LDAPS and STARTTLS connections.

mod gateway;
mod ldap;

pub use gateway::*;
pub use ldap::{LdapGateway, LdapSession};
