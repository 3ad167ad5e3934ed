//! Presented credentials and the identity used to bind

use std::fmt;

/// Logged in place of a token id
pub const TOKEN_SUBJECT: &str = "<token>";

/// What a caller presents for one authentication request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Username and password, challenged against the directory
    Password { username: String, password: String },
    /// Physical token identifier; possession is treated as proof
    Token { token_id: String },
}

impl Credential {
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential::Password {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn token(token_id: impl Into<String>) -> Self {
        Credential::Token {
            token_id: token_id.into(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Credential::Password { username, .. } => Some(username),
            Credential::Token { .. } => None,
        }
    }

    pub fn token_id(&self) -> Option<&str> {
        match self {
            Credential::Token { token_id } => Some(token_id),
            Credential::Password { .. } => None,
        }
    }

    /// Name suitable for log lines; a token id is itself a secret
    pub fn subject(&self) -> &str {
        match self {
            Credential::Password { username, .. } => username,
            Credential::Token { .. } => TOKEN_SUBJECT,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Token { .. } => f
                .debug_struct("Token")
                .field("token_id", &"<redacted>")
                .finish(),
        }
    }
}

/// Identity and secret presented to the directory bind operation.
#[derive(Clone, PartialEq, Eq)]
pub struct BindIdentity {
    pub identity: String,
    pub credential: String,
}

impl BindIdentity {
    pub fn new(identity: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            credential: credential.into(),
        }
    }
}

impl fmt::Debug for BindIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindIdentity")
            .field("identity", &self.identity)
            .field("credential", &"<redacted>")
            .finish()
    }
}
