//! The resolved identity of a request.

use serde::{Deserialize, Serialize};

/// Which resolver attached the identity.
///
/// Precedence is fixed: an explicit bearer token outranks the ambient
/// session, which outranks an inline-completed provider assertion. The
/// first writer wins; later resolvers never overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalSource {
    /// `Authorization` header resolved through the directory.
    Bearer,
    /// User id stored in the server-side session.
    Session,
    /// Provider assertion completed inline from the current request.
    Assertion,
}

/// The local user a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: String,
    source: PrincipalSource,
}

impl Principal {
    /// Creates a principal for a resolved user id.
    #[must_use]
    pub fn new(user_id: impl Into<String>, source: PrincipalSource) -> Self {
        Self {
            user_id: user_id.into(),
            source,
        }
    }

    /// Returns the local user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns which resolver attached this identity.
    #[must_use]
    pub fn source(&self) -> PrincipalSource {
        self.source
    }
}
