//! LDAP gateway implementation
//!
//! Handles LDAP connections, binds and searches over ldap3.
//! Supports LDAP, LDAPS (SSL), and STARTTLS connections.

use crate::directory::gateway::{DirectoryGateway, SearchRequest, SearchScope};
use async_trait::async_trait;
use dirauth_core::{DirectoryEntry, Error, ProviderConfig, Result, SessionOptions};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, ResultEntry, Scope, SearchEntry};
use tracing::debug;

/// RC 49: invalid credentials
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Gateway to a single LDAP/AD server
#[derive(Debug, Clone)]
pub struct LdapGateway {
    url: String,
    options: SessionOptions,
}

/// One bound connection, owned by a single authentication call
pub struct LdapSession {
    ldap: Ldap,
    identity: String,
}

impl LdapGateway {
    pub fn new(url: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            url: url.into(),
            options,
        }
    }

    pub fn from_provider(provider: &ProviderConfig) -> Self {
        Self::new(provider.url.clone(), provider.session.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create LDAP connection with proper TLS settings
    async fn create_connection(&self) -> Result<(LdapConnAsync, Ldap)> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.options.timeout)
            .set_starttls(self.options.start_tls)
            .set_no_tls_verify(self.options.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.url);

        LdapConnAsync::with_settings(settings, &self.url)
            .await
            .map_err(|e| Error::BindFailed(format!("Failed to connect to LDAP server: {}", e)))
    }
}

#[async_trait]
impl DirectoryGateway for LdapGateway {
    type Session = LdapSession;

    async fn bind(&self, identity: &str, credential: &str) -> Result<LdapSession> {
        let (conn, mut ldap) = self.create_connection().await?;

        ldap3::drive!(conn);

        let result = ldap
            .with_timeout(self.options.timeout)
            .simple_bind(identity, credential)
            .await
            .map_err(|e| Error::BindFailed(format!("Bind as {} failed: {}", identity, e)))?;

        if result.rc != 0 {
            let _ = ldap.unbind().await;

            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(Error::InvalidCredentials(identity.to_string()));
            }

            return Err(Error::BindFailed(format!(
                "Bind as {} failed with code {}: {}",
                identity, result.rc, result.text
            )));
        }

        debug!("Bound to {} as {}", self.url, identity);

        Ok(LdapSession {
            ldap,
            identity: identity.to_string(),
        })
    }

    async fn search(
        &self,
        session: &mut LdapSession,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>> {
        let filter = request.filter.to_string();
        let attrs: Vec<&str> = request.attributes.iter().map(String::as_str).collect();

        debug!("Searching {} ({:?})", request.base, request.scope);

        let (rs, _res) = session
            .ldap
            .with_timeout(self.options.timeout)
            .search(&request.base, ldap_scope(request.scope), &filter, attrs)
            .await
            .map_err(|e| Error::SearchFailed(format!("Search under {} failed: {}", request.base, e)))?
            .success()
            .map_err(|e| Error::SearchFailed(format!("Search under {} error: {}", request.base, e)))?;

        debug!("Search under {} returned {} entries", request.base, rs.len());

        Ok(search_entries(rs))
    }

    async fn close(&self, mut session: LdapSession) -> Result<()> {
        session.ldap.unbind().await.map_err(|e| {
            Error::SessionReleaseFailed(format!("Unbind of {} failed: {}", session.identity, e))
        })
    }
}

fn ldap_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Referrals and intermediate messages carry no entry and are skipped
fn search_entries(results: Vec<ResultEntry>) -> Vec<DirectoryEntry> {
    results
        .into_iter()
        .filter(|re| {
            if re.is_ref() || re.is_intermediate() {
                debug!("Skipping search reference or intermediate message");
                return false;
            }
            true
        })
        .map(SearchEntry::construct)
        .map(directory_entry)
        .collect()
}

/// Binary-valued attributes are dropped; only string values take part in matching.
fn directory_entry(entry: SearchEntry) -> DirectoryEntry {
    DirectoryEntry {
        dn: entry.dn,
        attributes: entry.attrs.into_iter().collect(),
    }
}
