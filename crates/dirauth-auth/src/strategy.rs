//! Provider-specific bind and membership behaviour
//!
//! The two directory modes differ in how a bind identity is formed and in how
//! group membership is discovered once bound:
//!
//! - domain directory: one subtree search for the subject, then every value of
//!   its attributes is prefix-matched against the catalog
//! - legacy directory: a successful bind authenticates; each catalog group is
//!   then looked up on its own and its member list checked for the username

use crate::directory::{DirectoryGateway, SearchFilter, SearchRequest, SearchScope, NO_ATTRIBUTES};
use crate::mapper;
use crate::resolver::resolve_bind_identity;
use crate::trail::ErrorTrail;
use dirauth_core::{
    AuthenticationResult, BindIdentity, Credential, DomainSettings, Error, GroupCatalog,
    LegacySettings, ProviderConfig, ProviderKind, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum DirectoryStrategy {
    Domain(DomainDirectory),
    Legacy(LegacyDirectory),
}

impl DirectoryStrategy {
    pub fn for_provider(provider: Arc<ProviderConfig>) -> Self {
        match &provider.kind {
            ProviderKind::DomainDirectory(settings) => DirectoryStrategy::Domain(DomainDirectory {
                settings: settings.clone(),
                users_base: provider.users_base(),
                provider: provider.clone(),
            }),
            ProviderKind::LegacyDirectory(settings) => DirectoryStrategy::Legacy(LegacyDirectory {
                settings: settings.clone(),
                groups_base: provider.groups_base(),
                provider: provider.clone(),
            }),
        }
    }

    pub fn resolve_bind_identity(&self, credential: &Credential) -> Result<BindIdentity> {
        match self {
            DirectoryStrategy::Domain(domain) => domain.resolve_bind_identity(credential),
            DirectoryStrategy::Legacy(legacy) => legacy.resolve_bind_identity(credential),
        }
    }

    /// Discover group membership over an already bound session.
    ///
    /// Never fails: faults are recorded in `trail` and the affected flags stay
    /// `false`. The returned result is total over `catalog`.
    pub async fn map_membership<G: DirectoryGateway>(
        &self,
        gateway: &G,
        session: &mut G::Session,
        credential: &Credential,
        catalog: &GroupCatalog,
        trail: &mut ErrorTrail,
    ) -> AuthenticationResult {
        match self {
            DirectoryStrategy::Domain(domain) => {
                domain
                    .map_membership(gateway, session, credential, catalog, trail)
                    .await
            }
            DirectoryStrategy::Legacy(legacy) => {
                legacy
                    .map_membership(gateway, session, credential, catalog, trail)
                    .await
            }
        }
    }
}

/// Domain-directory mode
#[derive(Debug, Clone)]
pub struct DomainDirectory {
    provider: Arc<ProviderConfig>,
    settings: DomainSettings,
    users_base: String,
}

impl DomainDirectory {
    pub fn resolve_bind_identity(&self, credential: &Credential) -> Result<BindIdentity> {
        resolve_bind_identity(credential, &self.provider)
    }

    /// Subject lookup: by token attribute for tokens, by username otherwise
    pub fn subject_filter(&self, credential: &Credential) -> SearchFilter {
        match credential {
            Credential::Token { token_id } => {
                SearchFilter::equals(&self.settings.token_attribute, token_id)
            }
            Credential::Password { username, .. } => {
                SearchFilter::equals(&self.settings.username_attribute, username)
            }
        }
    }

    pub async fn map_membership<G: DirectoryGateway>(
        &self,
        gateway: &G,
        session: &mut G::Session,
        credential: &Credential,
        catalog: &GroupCatalog,
        trail: &mut ErrorTrail,
    ) -> AuthenticationResult {
        let request = SearchRequest::new(
            self.users_base.clone(),
            SearchScope::Subtree,
            self.subject_filter(credential),
        )
        .with_attributes([NO_ATTRIBUTES]);

        match credential {
            Credential::Token { .. } => debug!(
                "Searching for subject by {}",
                self.settings.token_attribute
            ),
            Credential::Password { .. } => {
                debug!("Searching for subject with filter: {}", request.filter)
            }
        }

        let hits = match gateway.search(session, &request).await {
            Ok(hits) => hits,
            Err(e) => {
                trail.record(e);
                let mut result = AuthenticationResult::new();
                result.complete(catalog);
                return result;
            }
        };

        debug!("Found {} matching entries", hits.len());

        let requested = &self.settings.requested_attributes;
        let mut entries = Vec::with_capacity(hits.len());
        for hit in hits {
            match gateway.read_entry(session, &hit.dn, requested).await {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => trail.record(Error::MissingAttributes(hit.dn)),
                Err(e) => trail.record(e),
            }
        }

        let (mut result, rejected) = mapper::map_domain_entries(&entries, requested, catalog);
        for e in rejected {
            trail.record(e);
        }

        // Echoed as proof the token lookup ran
        result.token_id = credential.token_id().map(str::to_string);
        result
    }
}

/// Legacy-directory mode
#[derive(Debug, Clone)]
pub struct LegacyDirectory {
    provider: Arc<ProviderConfig>,
    settings: LegacySettings,
    groups_base: String,
}

impl LegacyDirectory {
    pub fn resolve_bind_identity(&self, credential: &Credential) -> Result<BindIdentity> {
        resolve_bind_identity(credential, &self.provider)
    }

    /// One-level lookup of a group by name under the groups location
    pub fn group_request(&self, group_name: &str) -> SearchRequest {
        SearchRequest::new(
            self.groups_base.clone(),
            SearchScope::OneLevel,
            SearchFilter::equals(&self.settings.group_attribute, group_name),
        )
        .with_attributes([self.settings.member_attribute.as_str()])
    }

    pub async fn map_membership<G: DirectoryGateway>(
        &self,
        gateway: &G,
        session: &mut G::Session,
        credential: &Credential,
        catalog: &GroupCatalog,
        trail: &mut ErrorTrail,
    ) -> AuthenticationResult {
        // A valid bind alone proves a valid user
        let mut result = AuthenticationResult::new();
        result.authenticated = true;

        let Some(username) = credential.username() else {
            trail.record(Error::UnsupportedCredential(
                "group lookup in a legacy directory needs a username".into(),
            ));
            result.complete(catalog);
            return result;
        };

        // Each group stands alone; a failed lookup only affects its own flag
        let mut found = BTreeMap::new();
        for (key, group_name) in catalog.iter() {
            match gateway.search(session, &self.group_request(group_name)).await {
                Ok(entries) => {
                    found.insert(key.to_string(), entries);
                }
                Err(e) => trail.record(e),
            }
        }

        result.groups = mapper::map_legacy_groups(
            &found,
            catalog,
            &self.settings.member_attribute,
            username,
        );

        for (key, member) in &result.groups {
            debug!("{} in {}: {}", username, key, member);
        }

        result
    }
}
