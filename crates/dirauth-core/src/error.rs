//! Error types for Dirauth

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Provider type not found: {0}")]
    UnsupportedProviderKind(String),

    // Credential Errors
    #[error("Unsupported credential: {0}")]
    UnsupportedCredential(String),

    #[error("Invalid credentials for {0}")]
    InvalidCredentials(String),

    // Directory Errors
    #[error("Bind failed: {0}")]
    BindFailed(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Entry {0} has none of the specified attributes")]
    MissingAttributes(String),

    #[error("Failed to release directory session: {0}")]
    SessionReleaseFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigInvalid(_) => "ConfigInvalid",
            Error::UnsupportedProviderKind(_) => "ConfigInvalid",
            Error::UnsupportedCredential(_) => "BindFailed",
            Error::InvalidCredentials(_) => "BindFailed",
            Error::BindFailed(_) => "BindFailed",
            Error::SearchFailed(_) => "SearchFailed",
            Error::MissingAttributes(_) => "MissingAttributes",
            Error::SessionReleaseFailed(_) => "SessionReleaseFailed",
            Error::Io(_) => "InternalError",
            Error::Other(_) => "InternalError",
        }
    }

    /// Whether this error must escape the authentication boundary instead of
    /// being recorded and degraded to `authenticated = false`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigInvalid(_)
                | Error::UnsupportedProviderKind(_)
                | Error::SessionReleaseFailed(_)
        )
    }
}
