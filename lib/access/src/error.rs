//! Error types for the gatehouse-access crate.
//!
//! Each collaborator seam has its own error enum:
//! - `ActivationError`: provider activation failures (configuration time)
//! - `HandshakeError`: provider exchange failures (request time)
//! - `SessionError`: session store failures
//! - `DirectoryError`: user directory failures

use std::fmt;

/// Errors from activating a provider with credentials.
///
/// Activation happens once at startup; any of these aborts setup before a
/// single route is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// The provider is not a member of the catalog.
    InvalidProvider { slug: String },
    /// The callback base URL (or another argument) does not parse.
    InvalidArgument { reason: String },
    /// The provider mandates a discovery/source URL and none was usable.
    MissingSource { slug: String },
    /// Registering the client with the handshake capability failed.
    Registration { slug: String, reason: String },
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProvider { slug } => {
                write!(f, "provider '{slug}' is not in the catalog")
            }
            Self::InvalidArgument { reason } => {
                write!(f, "invalid activation argument: {reason}")
            }
            Self::MissingSource { slug } => {
                write!(f, "provider '{slug}' requires a source URL")
            }
            Self::Registration { slug, reason } => {
                write!(f, "failed to register provider '{slug}': {reason}")
            }
        }
    }
}

impl std::error::Error for ActivationError {}

/// Errors from the redirect-based provider exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// No client registered for the slug.
    NotRegistered { slug: String },
    /// The current request carries no completable assertion.
    NoPendingAttempt,
    /// The provider rejected or failed the exchange.
    Exchange { slug: String, reason: String },
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered { slug } => {
                write!(f, "provider '{slug}' is not registered")
            }
            Self::NoPendingAttempt => {
                write!(f, "no pending handshake to complete")
            }
            Self::Exchange { slug, reason } => {
                write!(f, "provider '{slug}' exchange failed: {reason}")
            }
        }
    }
}

impl std::error::Error for HandshakeError {}

/// Errors from the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The backing store failed.
    Store { reason: String },
    /// Committing the session did not produce a durable token.
    Commit { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { reason } => write!(f, "session store error: {reason}"),
            Self::Commit { reason } => write!(f, "session commit failed: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No matching record.
    NotFound,
    /// The backing store failed.
    Backend { reason: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no matching record in the directory"),
            Self::Backend { reason } => write!(f, "directory backend error: {reason}"),
        }
    }
}

impl std::error::Error for DirectoryError {}
