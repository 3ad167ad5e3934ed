//! Bind identity resolution

use dirauth_core::{BindIdentity, Credential, Error, ProviderConfig, ProviderKind, Result};

/// Build the identity and secret presented to the directory for a credential.
///
/// - token: the shared anonymous-bind pair (domain mode only)
/// - domain mode: `username@domain_suffix`
/// - legacy mode: `uid=<username>,<users location><base DN>`
pub fn resolve_bind_identity(
    credential: &Credential,
    provider: &ProviderConfig,
) -> Result<BindIdentity> {
    match (credential, &provider.kind) {
        (Credential::Token { .. }, ProviderKind::DomainDirectory(settings)) => {
            Ok(settings.anonymous_bind.clone())
        }
        (Credential::Token { .. }, ProviderKind::LegacyDirectory(_)) => {
            Err(Error::UnsupportedCredential(
                "token authentication requires a domain directory provider".into(),
            ))
        }
        (Credential::Password { username, password }, kind) => {
            // An empty simple bind is an unauthenticated bind on most servers
            if username.is_empty() || password.is_empty() {
                return Err(Error::InvalidCredentials(username.clone()));
            }

            let identity = match kind {
                ProviderKind::DomainDirectory(settings) => {
                    format!("{}@{}", username, settings.domain_suffix)
                }
                ProviderKind::LegacyDirectory(_) => format!(
                    "uid={},{}{}",
                    ldap3::dn_escape(username.as_str()),
                    provider.users_location,
                    provider.base_dn
                ),
            };

            Ok(BindIdentity::new(identity, password.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{domain_provider, legacy_provider};

    #[test]
    fn test_domain_password_binds_as_user_principal() {
        let bind =
            resolve_bind_identity(&Credential::password("jdoe", "pw"), &domain_provider()).unwrap();
        assert_eq!(bind.identity, "jdoe@example.com");
        assert_eq!(bind.credential, "pw");
    }

    #[test]
    fn test_legacy_password_binds_as_uid_dn() {
        let bind =
            resolve_bind_identity(&Credential::password("jdoe", "pw"), &legacy_provider()).unwrap();
        assert_eq!(bind.identity, "uid=jdoe,ou=People,dc=example,dc=com");
        assert_eq!(bind.credential, "pw");
    }

    #[test]
    fn test_token_binds_with_anonymous_identity() {
        let bind = resolve_bind_identity(&Credential::token("0042"), &domain_provider()).unwrap();
        assert_eq!(bind, BindIdentity::new("svc-lookup@example.com", "lookup-secret"));
        assert_ne!(bind.identity, "0042");
        assert_ne!(bind.credential, "0042");
    }

    #[test]
    fn test_token_unsupported_in_legacy_mode() {
        let err = resolve_bind_identity(&Credential::token("0042"), &legacy_provider()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCredential(_)));
    }

    #[test]
    fn test_empty_password_rejected() {
        let err =
            resolve_bind_identity(&Credential::password("jdoe", ""), &domain_provider()).unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials(_)));
    }

    #[test]
    fn test_legacy_username_is_dn_escaped() {
        let bind = resolve_bind_identity(
            &Credential::password("doe,ou=Admins", "pw"),
            &legacy_provider(),
        )
        .unwrap();
        assert!(!bind.identity.starts_with("uid=doe,ou=Admins"));
        assert!(bind.identity.ends_with(",ou=People,dc=example,dc=com"));
    }
}
