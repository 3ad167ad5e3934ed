//! Test fixtures and a scripted in-memory gateway

use crate::directory::{DirectoryGateway, SearchRequest};
use async_trait::async_trait;
use dirauth_core::{
    BindIdentity, DirectoryEntry, DomainSettings, Error, GroupCatalog, LegacySettings,
    ProviderConfig, ProviderKind, Result, SessionOptions,
};
use parking_lot::Mutex;
use std::collections::HashMap;

pub(crate) fn catalog() -> GroupCatalog {
    GroupCatalog::new([("SCHED_ADMIN", "Admins"), ("SCHED_USER", "Users")]).unwrap()
}

pub(crate) fn domain_provider() -> ProviderConfig {
    ProviderConfig {
        url: "ldaps://dc.example.com:636".into(),
        base_dn: "dc=example,dc=com".into(),
        users_location: "ou=People,".into(),
        groups_location: "ou=Groups,".into(),
        kind: ProviderKind::DomainDirectory(DomainSettings {
            domain_suffix: "example.com".into(),
            anonymous_bind: BindIdentity::new("svc-lookup@example.com", "lookup-secret"),
            token_attribute: "serialNumber".into(),
            username_attribute: "sAMAccountName".into(),
            requested_attributes: dirauth_core::types::DEFAULT_REQUESTED_ATTRIBUTES
                .iter()
                .map(|a| a.to_string())
                .collect(),
        }),
        override_credentials: None,
        session: SessionOptions::default(),
    }
}

pub(crate) fn legacy_provider() -> ProviderConfig {
    ProviderConfig {
        url: "ldap://ldap.example.com".into(),
        base_dn: "dc=example,dc=com".into(),
        users_location: "ou=People,".into(),
        groups_location: "cn=groups,".into(),
        kind: ProviderKind::LegacyDirectory(LegacySettings {
            group_attribute: "cn".into(),
            member_attribute: "memberUid".into(),
        }),
        override_credentials: None,
        session: SessionOptions::default(),
    }
}

/// Everything the gateway was asked to do
#[derive(Debug, Default, Clone)]
pub(crate) struct CallLog {
    pub binds: Vec<String>,
    pub searches: Vec<SearchRequest>,
    pub reads: Vec<String>,
    pub opened: usize,
    pub closed: usize,
}

impl CallLog {
    pub fn touched_directory(&self) -> bool {
        !self.binds.is_empty() || !self.searches.is_empty() || !self.reads.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct MockSession {
    pub identity: String,
}

/// Scripted gateway: accounts that bind, search results keyed by rendered
/// filter, and entries returned by `read_entry` keyed by DN.
#[derive(Default)]
pub(crate) struct MockGateway {
    accounts: HashMap<String, String>,
    unreachable: bool,
    searches: HashMap<String, std::result::Result<Vec<DirectoryEntry>, String>>,
    entries: HashMap<String, std::result::Result<DirectoryEntry, String>>,
    fail_release: bool,
    log: Mutex<CallLog>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, identity: &str, credential: &str) -> Self {
        self.accounts.insert(identity.into(), credential.into());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_search(mut self, filter: &str, hits: Vec<DirectoryEntry>) -> Self {
        self.searches.insert(filter.into(), Ok(hits));
        self
    }

    pub fn with_failed_search(mut self, filter: &str, message: &str) -> Self {
        self.searches.insert(filter.into(), Err(message.into()));
        self
    }

    pub fn with_entry(mut self, entry: DirectoryEntry) -> Self {
        self.entries.insert(entry.dn.clone(), Ok(entry));
        self
    }

    pub fn with_failed_read(mut self, dn: &str, message: &str) -> Self {
        self.entries.insert(dn.into(), Err(message.into()));
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.log.lock().clone()
    }
}

#[async_trait]
impl DirectoryGateway for MockGateway {
    type Session = MockSession;

    async fn bind(&self, identity: &str, credential: &str) -> Result<MockSession> {
        let mut log = self.log.lock();
        log.binds.push(identity.to_string());

        if self.unreachable {
            return Err(Error::BindFailed(format!(
                "Failed to connect to LDAP server for {}",
                identity
            )));
        }
        if self.accounts.get(identity).map(String::as_str) != Some(credential) {
            return Err(Error::InvalidCredentials(identity.to_string()));
        }

        log.opened += 1;
        Ok(MockSession {
            identity: identity.to_string(),
        })
    }

    async fn search(
        &self,
        _session: &mut MockSession,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>> {
        self.log.lock().searches.push(request.clone());

        match self.searches.get(&request.filter.to_string()) {
            Some(Ok(hits)) => Ok(hits.clone()),
            Some(Err(message)) => Err(Error::SearchFailed(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn read_entry(
        &self,
        _session: &mut MockSession,
        dn: &str,
        attributes: &[String],
    ) -> Result<Option<DirectoryEntry>> {
        self.log.lock().reads.push(dn.to_string());

        match self.entries.get(dn) {
            Some(Ok(entry)) => {
                // Only the requested attributes come back
                let mut projected = DirectoryEntry::new(entry.dn.clone());
                for (name, values) in &entry.attributes {
                    if attributes.iter().any(|a| a.eq_ignore_ascii_case(name)) {
                        projected.attributes.insert(name.clone(), values.clone());
                    }
                }
                Ok(Some(projected))
            }
            Some(Err(message)) => Err(Error::SearchFailed(message.clone())),
            None => Ok(None),
        }
    }

    async fn close(&self, session: MockSession) -> Result<()> {
        self.log.lock().closed += 1;

        if self.fail_release {
            return Err(Error::SessionReleaseFailed(format!(
                "Unbind of {} failed",
                session.identity
            )));
        }
        Ok(())
    }
}
