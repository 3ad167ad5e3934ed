//! Authentication orchestration
//!
//! One call walks: override check, then (directory mode) bind, membership
//! discovery for the active provider, and finalisation. Every failure short
//! of a failed session release is recorded and degrades to
//! `authenticated = false`; the caller always gets a result that carries a
//! flag for every catalog group.

use crate::directory::{DirectoryGateway, LdapGateway};
use crate::strategy::DirectoryStrategy;
use crate::trail::{Diagnostics, ErrorTrail, TrailScope};
use dirauth_core::{
    AuthenticationResult, Credential, DirAuthConfig, Error, GroupCatalog, OverrideCredentials,
    ProviderConfig, Result,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Authentication engine.
///
/// Holds no per-call state besides committed diagnostics: the directory
/// session lives inside each call, so one instance can serve concurrent calls.
pub struct Authenticator<G: DirectoryGateway> {
    gateway: G,
    provider: Arc<ProviderConfig>,
    catalog: Arc<GroupCatalog>,
    strategy: DirectoryStrategy,
    diagnostics: Diagnostics,
}

impl Authenticator<LdapGateway> {
    /// Validate the configuration and build an engine over an LDAP gateway
    pub fn from_config(config: &DirAuthConfig) -> Result<Self> {
        let provider = Arc::new(config.provider_config()?);
        let catalog = Arc::new(config.group_catalog()?);
        let gateway = LdapGateway::from_provider(&provider);

        Ok(Self::new(gateway, provider, catalog))
    }
}

impl<G: DirectoryGateway> Authenticator<G> {
    pub fn new(gateway: G, provider: Arc<ProviderConfig>, catalog: Arc<GroupCatalog>) -> Self {
        Self {
            gateway,
            strategy: DirectoryStrategy::for_provider(provider.clone()),
            provider,
            catalog,
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn with_trail_scope(mut self, scope: TrailScope) -> Self {
        self.diagnostics = Diagnostics::new(scope);
        self
    }

    pub fn catalog(&self) -> &GroupCatalog {
        &self.catalog
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Recorded error messages, oldest first
    pub fn errors(&self) -> Vec<String> {
        self.diagnostics.errors()
    }

    pub async fn authenticate_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult> {
        self.authenticate(&Credential::password(username, password))
            .await
    }

    pub async fn authenticate_token(&self, token_id: &str) -> Result<AuthenticationResult> {
        self.authenticate(&Credential::token(token_id)).await
    }

    /// Authenticate one credential.
    ///
    /// Only `Error::SessionReleaseFailed` is returned as an error; every other
    /// failure is available through [`errors`](Self::errors).
    pub async fn authenticate(&self, credential: &Credential) -> Result<AuthenticationResult> {
        let mut trail = ErrorTrail::new();

        let outcome = match &self.provider.override_credentials {
            Some(expected) => Ok(self.check_override(expected, credential, &mut trail)),
            None => {
                info!(
                    "Trying {} authentication by: {}",
                    self.provider.provider_type(),
                    credential.subject()
                );
                self.authenticate_with_directory(credential, &mut trail)
                    .await
            }
        };

        self.diagnostics.commit(trail);

        let mut result = outcome?;
        result.complete(&self.catalog);

        info!(
            "Authentication of {} finished: authenticated={}",
            credential.subject(),
            result.authenticated
        );
        debug!("Group flags: {:?}", result.groups);

        Ok(result)
    }

    /// Break-glass path: no directory contact at all
    fn check_override(
        &self,
        expected: &OverrideCredentials,
        credential: &Credential,
        trail: &mut ErrorTrail,
    ) -> AuthenticationResult {
        info!("Override authentication");

        let mut result = AuthenticationResult::new();
        match credential {
            Credential::Password { username, password } if expected.matches(username, password) => {
                result.authenticated = true;
                result.grant_all(&self.catalog);
            }
            Credential::Password { username, .. } => {
                trail.record(Error::InvalidCredentials(username.clone()));
            }
            Credential::Token { .. } => {
                trail.record(Error::UnsupportedCredential(
                    "token authentication is unavailable in override mode".into(),
                ));
            }
        }

        result
    }

    async fn authenticate_with_directory(
        &self,
        credential: &Credential,
        trail: &mut ErrorTrail,
    ) -> Result<AuthenticationResult> {
        let bind = match self.strategy.resolve_bind_identity(credential) {
            Ok(bind) => bind,
            Err(e) => {
                trail.record(e);
                return Ok(AuthenticationResult::new());
            }
        };

        let mut session = match self.gateway.bind(&bind.identity, &bind.credential).await {
            Ok(session) => session,
            Err(e) => {
                trail.record(e);
                return Ok(AuthenticationResult::new());
            }
        };

        debug!("Connection and credentials valid for {}", bind.identity);

        let result = self
            .strategy
            .map_membership(
                &self.gateway,
                &mut session,
                credential,
                &self.catalog,
                trail,
            )
            .await;

        // Reached on every path that opened a session
        if let Err(e) = self.gateway.close(session).await {
            warn!("Directory session for {} leaked", bind.identity);
            trail.record(&e);
            return Err(e);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, domain_provider, legacy_provider, MockGateway};
    use dirauth_core::DirectoryEntry;

    const USERS_BASE: &str = "ou=People,dc=example,dc=com";
    const JDOE_DN: &str = "CN=John Doe,OU=People,DC=example,DC=com";

    fn engine(provider: ProviderConfig, gateway: MockGateway) -> Authenticator<MockGateway> {
        Authenticator::new(gateway, Arc::new(provider), Arc::new(catalog()))
    }

    fn with_override(mut provider: ProviderConfig) -> ProviderConfig {
        provider.override_credentials = Some(OverrideCredentials {
            identity: "breakglass".into(),
            credential: "s3cret".into(),
        });
        provider
    }

    fn jdoe(member_of: &[&str]) -> DirectoryEntry {
        DirectoryEntry::new(JDOE_DN)
            .with_attribute("cn", ["John Doe"])
            .with_attribute("sAMAccountName", ["jdoe"])
            .with_attribute("memberOf", member_of.iter().copied())
            .with_attribute("objectGUID", ["not requested"])
    }

    fn domain_gateway(member_of: &[&str]) -> MockGateway {
        MockGateway::new()
            .with_account("jdoe@example.com", "pw")
            .with_account("svc-lookup@example.com", "lookup-secret")
            .with_search("(sAMAccountName=jdoe)", vec![DirectoryEntry::new(JDOE_DN)])
            .with_search("(serialNumber=0042)", vec![DirectoryEntry::new(JDOE_DN)])
            .with_entry(jdoe(member_of))
    }

    fn legacy_gateway() -> MockGateway {
        MockGateway::new()
            .with_account("uid=jdoe,ou=People,dc=example,dc=com", "pw")
            .with_search(
                "(cn=Admins)",
                vec![DirectoryEntry::new("cn=Admins,cn=groups,dc=example,dc=com")
                    .with_attribute("memberUid", ["alice", "bob"])],
            )
            .with_search(
                "(cn=Users)",
                vec![DirectoryEntry::new("cn=Users,cn=groups,dc=example,dc=com")
                    .with_attribute("memberUid", ["alice", "jdoe"])],
            )
    }

    #[tokio::test]
    async fn test_override_accepts_configured_pair() {
        let auth = engine(with_override(domain_provider()), domain_gateway(&[]));

        let result = auth.authenticate_password("breakglass", "s3cret").await.unwrap();

        assert!(result.authenticated);
        assert!(result.is_member("SCHED_ADMIN"));
        assert!(result.is_member("SCHED_USER"));
        assert!(!auth.gateway().calls().touched_directory());
        assert!(auth.errors().is_empty());
    }

    #[tokio::test]
    async fn test_override_rejects_other_pairs() {
        let auth = engine(with_override(domain_provider()), domain_gateway(&[]));

        // Valid directory credentials are irrelevant in override mode
        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert!(result.groups.values().all(|member| !member));
        assert!(!auth.gateway().calls().touched_directory());
        assert_eq!(auth.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_override_rejects_tokens() {
        let auth = engine(with_override(domain_provider()), domain_gateway(&[]));

        let result = auth.authenticate_token("0042").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.token_id.is_none());
        assert!(!auth.gateway().calls().touched_directory());
    }

    #[tokio::test]
    async fn test_domain_scenario() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Users,OU=Groups,DC=x"]));

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(result.authenticated);
        assert_eq!(result.groups.get("SCHED_ADMIN"), Some(&false));
        assert_eq!(result.groups.get("SCHED_USER"), Some(&true));
        assert_eq!(result.attributes.get("cn").map(String::as_str), Some("John Doe"));
        assert!(!result.attributes.contains_key("objectGUID"));
        assert!(result.token_id.is_none());

        let calls = auth.gateway().calls();
        assert_eq!(calls.binds, vec!["jdoe@example.com".to_string()]);
        assert_eq!(calls.searches[0].base, USERS_BASE);
        assert_eq!(calls.reads, vec![JDOE_DN.to_string()]);
        assert_eq!(calls.closed, 1);
        assert!(auth.errors().is_empty());
    }

    #[tokio::test]
    async fn test_domain_mixed_case_membership() {
        let auth = engine(
            domain_provider(),
            domain_gateway(&["CN=Admins,OU=Groups,DC=x", "cn=users,ou=groups,dc=x"]),
        );

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();
        assert!(result.is_member("SCHED_ADMIN"));
        assert!(result.is_member("SCHED_USER"));
    }

    #[tokio::test]
    async fn test_domain_bind_without_groups_is_not_authenticated() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Printers,OU=Groups,DC=x"]));

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert_eq!(auth.gateway().calls().closed, 1);
    }

    #[tokio::test]
    async fn test_token_binds_with_anonymous_identity_and_echoes() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Admins,OU=Groups,DC=x"]));

        let result = auth.authenticate_token("0042").await.unwrap();

        assert!(result.authenticated);
        assert!(result.is_member("SCHED_ADMIN"));
        assert_eq!(result.token_id.as_deref(), Some("0042"));

        let calls = auth.gateway().calls();
        assert_eq!(calls.binds, vec!["svc-lookup@example.com".to_string()]);
        assert_eq!(calls.searches[0].filter.to_string(), "(serialNumber=0042)");
    }

    #[tokio::test]
    async fn test_bind_failure_is_recorded() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Admins,OU=Groups,DC=x"]));

        let result = auth.authenticate_password("jdoe", "wrong").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert_eq!(auth.errors(), vec!["Invalid credentials for jdoe@example.com".to_string()]);

        let calls = auth.gateway().calls();
        assert!(calls.searches.is_empty());
        assert_eq!(calls.opened, 0);
        assert_eq!(calls.closed, 0);
    }

    #[tokio::test]
    async fn test_unreachable_directory_is_recorded() {
        let auth = engine(domain_provider(), MockGateway::new().unreachable());

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert!(auth.errors()[0].starts_with("Bind failed"));
    }

    #[tokio::test]
    async fn test_empty_password_never_reaches_directory() {
        let auth = engine(domain_provider(), domain_gateway(&[]));

        let result = auth.authenticate_password("jdoe", "").await.unwrap();

        assert!(!result.authenticated);
        assert!(!auth.gateway().calls().touched_directory());
        assert_eq!(auth.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_subject_search_failure_releases_session() {
        let gateway = MockGateway::new()
            .with_account("jdoe@example.com", "pw")
            .with_failed_search("(sAMAccountName=jdoe)", "No such object");
        let auth = engine(domain_provider(), gateway);

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert_eq!(auth.errors(), vec!["Search failed: No such object".to_string()]);
        assert_eq!(auth.gateway().calls().closed, 1);
    }

    #[tokio::test]
    async fn test_missing_attributes_are_localized() {
        let ghost_dn = "CN=Ghost,OU=People,DC=example,DC=com";
        let broken_dn = "CN=Broken,OU=People,DC=example,DC=com";
        let gateway = MockGateway::new()
            .with_account("jdoe@example.com", "pw")
            .with_search(
                "(sAMAccountName=jdoe)",
                vec![
                    DirectoryEntry::new(ghost_dn),
                    DirectoryEntry::new(broken_dn),
                    DirectoryEntry::new(JDOE_DN),
                ],
            )
            .with_entry(DirectoryEntry::new(ghost_dn).with_attribute("objectClass", ["user"]))
            .with_failed_read(broken_dn, "Insufficient access")
            .with_entry(jdoe(&["CN=Users,OU=Groups,DC=x"]));
        let auth = engine(domain_provider(), gateway);

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(result.authenticated);
        assert!(result.is_member("SCHED_USER"));
        let errors = auth.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("none of the specified attributes")));
        assert!(errors.iter().any(|e| e.contains("Insufficient access")));
    }

    #[tokio::test]
    async fn test_legacy_scenario() {
        let auth = engine(legacy_provider(), legacy_gateway());

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(result.authenticated);
        assert_eq!(result.groups.get("SCHED_ADMIN"), Some(&false));
        assert_eq!(result.groups.get("SCHED_USER"), Some(&true));

        let calls = auth.gateway().calls();
        assert_eq!(calls.binds, vec!["uid=jdoe,ou=People,dc=example,dc=com".to_string()]);
        assert_eq!(calls.searches.len(), 2);
        assert!(calls
            .searches
            .iter()
            .all(|s| s.base == "cn=groups,dc=example,dc=com"));
        assert_eq!(calls.closed, 1);
    }

    #[tokio::test]
    async fn test_legacy_bind_alone_authenticates() {
        let gateway = MockGateway::new().with_account("uid=jdoe,ou=People,dc=example,dc=com", "pw");
        let auth = engine(legacy_provider(), gateway);

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert!(result.groups.values().all(|member| !member));
    }

    #[tokio::test]
    async fn test_legacy_group_failure_is_isolated() {
        let gateway = legacy_gateway().with_failed_search("(cn=Admins)", "Operations error");
        let auth = engine(legacy_provider(), gateway);

        let result = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert!(result.authenticated);
        assert_eq!(result.groups.get("SCHED_ADMIN"), Some(&false));
        assert_eq!(result.groups.get("SCHED_USER"), Some(&true));
        assert_eq!(auth.errors(), vec!["Search failed: Operations error".to_string()]);
        assert_eq!(auth.gateway().calls().searches.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_rejects_tokens() {
        let auth = engine(legacy_provider(), legacy_gateway());

        let result = auth.authenticate_token("0042").await.unwrap();

        assert!(!result.authenticated);
        assert!(result.is_total_over(auth.catalog()));
        assert!(!auth.gateway().calls().touched_directory());
    }

    #[tokio::test]
    async fn test_release_failure_escalates() {
        let auth = engine(
            domain_provider(),
            domain_gateway(&["CN=Users,OU=Groups,DC=x"]).failing_release(),
        );

        let err = auth.authenticate_password("jdoe", "pw").await.unwrap_err();

        assert!(matches!(err, Error::SessionReleaseFailed(_)));
        assert!(err.is_fatal());
        assert_eq!(auth.gateway().calls().closed, 1);
        assert_eq!(auth.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Users,OU=Groups,DC=x"]));

        let first = auth.authenticate_password("jdoe", "pw").await.unwrap();
        let second = auth.authenticate_password("jdoe", "pw").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_flat_map(), second.to_flat_map());
    }

    #[tokio::test]
    async fn test_per_call_diagnostics() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Users,OU=Groups,DC=x"]));

        auth.authenticate_password("jdoe", "wrong").await.unwrap();
        assert_eq!(auth.errors().len(), 1);

        auth.authenticate_password("jdoe", "pw").await.unwrap();
        assert!(auth.errors().is_empty());
    }

    #[tokio::test]
    async fn test_accumulated_diagnostics() {
        let auth = engine(domain_provider(), domain_gateway(&["CN=Users,OU=Groups,DC=x"]))
            .with_trail_scope(TrailScope::Accumulate);

        auth.authenticate_password("jdoe", "wrong").await.unwrap();
        auth.authenticate_password("jdoe", "pw").await.unwrap();
        auth.authenticate_password("jdoe", "bad").await.unwrap();

        assert_eq!(auth.errors().len(), 2);
    }

    #[tokio::test]
    async fn test_shared_engine_concurrent_calls() {
        let auth = Arc::new(engine(
            domain_provider(),
            domain_gateway(&["CN=Users,OU=Groups,DC=x"]),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let auth = auth.clone();
            handles.push(tokio::spawn(async move {
                let password = if i % 2 == 0 { "pw" } else { "wrong" };
                auth.authenticate_password("jdoe", password).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.unwrap();
            assert_eq!(result.authenticated, i % 2 == 0);
            assert!(result.is_total_over(auth.catalog()));
        }

        let calls = auth.gateway().calls();
        assert_eq!(calls.opened, 4);
        assert_eq!(calls.closed, 4);
    }
}
