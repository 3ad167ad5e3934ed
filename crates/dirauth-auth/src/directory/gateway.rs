//! Gateway trait and search request types

use async_trait::async_trait;
use dirauth_core::{DirectoryEntry, Result};
use std::fmt;

/// Attribute selector asking the directory to return no attributes
pub const NO_ATTRIBUTES: &str = "1.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base entry only
    Base,
    /// Immediate children of the base
    OneLevel,
    /// The base and all its descendants
    Subtree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// `(attribute=value)` with the value escaped
    Equals { attribute: String, value: String },
    /// `(attribute=*)`
    Present(String),
}

impl SearchFilter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        SearchFilter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        SearchFilter::Present(attribute.into())
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFilter::Equals { attribute, value } => {
                write!(f, "({}={})", attribute, ldap3::ldap_escape(value.as_str()))
            }
            SearchFilter::Present(attribute) => write!(f, "({}=*)", attribute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: SearchFilter,
    /// Attributes to return; empty means all user attributes
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(base: impl Into<String>, scope: SearchScope, filter: SearchFilter) -> Self {
        Self {
            base: base.into(),
            scope,
            filter,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Bind and search operations against a directory.
///
/// A session is obtained from [`bind`](Self::bind), threaded explicitly through
/// every search of one call, and handed back to [`close`](Self::close). Sessions
/// are never stored on the gateway, so one gateway serves concurrent calls.
/// Implementations bound every operation with a caller-configured timeout.
#[async_trait]
pub trait DirectoryGateway: Send + Sync {
    type Session: Send;

    /// Establish an authenticated session.
    ///
    /// Rejected credentials surface as `Error::InvalidCredentials`, anything else
    /// (unreachable server, TLS failure, timeout) as `Error::BindFailed`.
    async fn bind(&self, identity: &str, credential: &str) -> Result<Self::Session>;

    async fn search(
        &self,
        session: &mut Self::Session,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>>;

    /// Read the named attributes of a single entry.
    async fn read_entry(
        &self,
        session: &mut Self::Session,
        dn: &str,
        attributes: &[String],
    ) -> Result<Option<DirectoryEntry>> {
        let request = SearchRequest::new(dn, SearchScope::Base, SearchFilter::present("objectClass"))
            .with_attributes(attributes.iter().cloned());

        Ok(self.search(session, &request).await?.into_iter().next())
    }

    /// Release a session. Failure here means a possibly leaked connection.
    async fn close(&self, session: Self::Session) -> Result<()>;
}
