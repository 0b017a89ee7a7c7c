//! The provider handshake capability.
//!
//! The gateway treats the redirect-based OAuth2/OIDC exchange as an
//! instance-owned capability: activation registers a client per provider,
//! `authorization_url` starts a round-trip, `complete` finishes one. No
//! process-global registry is involved, so several independently configured
//! gateways can coexist in one process.

use crate::error::{ActivationError, HandshakeError};
use crate::provider::Provider;
use crate::session::SessionData;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// What a completed handshake asserts about the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// The provider's stable subject identifier.
    pub subject: String,
    /// Email address asserted by the provider.
    pub email: String,
    /// Display name asserted by the provider.
    pub name: String,
}

/// Query parameters the provider sends back to the callback endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// CSRF state echoed by the provider.
    pub state: Option<String>,
}

impl CallbackParams {
    /// Returns true if the request carries anything completable at all.
    #[must_use]
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }
}

/// A catalog provider activated with deployment credentials.
#[derive(Debug, Clone)]
pub struct ProviderRegistration {
    /// The catalog entry being activated.
    pub provider: &'static Provider,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Derived callback URL (`{base}/auth/callback/{slug}`).
    pub callback_url: Url,
    /// Discovery/source URL for providers that mandate one.
    pub source: Option<Url>,
    /// Merged scope set (defaults plus extras, normalized).
    pub scopes: Vec<String>,
}

/// Drives the redirect-based exchange with identity providers.
#[async_trait]
pub trait Handshake: Send + Sync {
    /// Registers a client for the provider. Called once per activation,
    /// before any route is served.
    async fn activate(&self, registration: ProviderRegistration) -> Result<(), ActivationError>;

    /// Builds the authorization URL for a fresh round-trip, stashing
    /// whatever state the completion will need in the session.
    async fn authorization_url(
        &self,
        slug: &str,
        session: &mut SessionData,
    ) -> Result<String, HandshakeError>;

    /// Completes a pending round-trip from the callback request.
    ///
    /// Consumes the handshake state stored by [`authorization_url`];
    /// a request with nothing to complete fails with
    /// [`HandshakeError::NoPendingAttempt`].
    ///
    /// [`authorization_url`]: Handshake::authorization_url
    async fn complete(
        &self,
        slug: &str,
        params: &CallbackParams,
        session: &mut SessionData,
    ) -> Result<ProviderIdentity, HandshakeError>;

    /// Best-effort provider-side logout/revocation hook.
    async fn revoke(&self, slug: &str, session: &SessionData) -> Result<(), HandshakeError>;
}
