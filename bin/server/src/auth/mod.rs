//! Authentication gateway for the gatehouse server.
//!
//! This module provides:
//! - Provider activation and the registered provider set (`GatewayBuilder`)
//! - Identity extractors deriving a request principal from a bearer token,
//!   the session, or an inline-completed provider assertion
//! - The flow controller routes (login, logout, providers, whoami, refetch,
//!   account linking)
//! - The three-way callback state machine shared by all providers
//!
//! # Identity Model
//!
//! Identity is resolved once per request into an explicit `Principal`, with
//! fixed precedence: bearer token over session over inline assertion. The
//! handshake capability is instance-owned and injected, so several
//! independently configured gateways can coexist in one process.

pub mod callback;
pub mod middleware;
pub mod oidc;
pub mod routes;

pub use middleware::{GatewaySession, MaybePrincipal, RequirePrincipal};
pub use oidc::OidcHandshake;

use axum::{Router, routing::get};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use gatehouse_access::{
    ActivationError, Handshake, Provider, ProviderRegistration, SessionStore, UserDirectory,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

/// Session cookie name.
pub(crate) const SESSION_COOKIE: &str = "session";

/// Cookie naming the provider of a pending handshake.
pub(crate) const PROVIDER_COOKIE: &str = "provider";

/// Cookie naming a pending callback sub-flow.
pub(crate) const FLOW_COOKIE: &str = "pending_flow";

/// Redirect targets after the auth flows finish.
#[derive(Debug, Clone)]
pub struct Paths {
    /// After a successful login callback.
    pub after_login: String,
    /// After logout.
    pub after_logout: String,
    /// After refetch and account-linking callbacks.
    pub profile: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            after_login: "/".to_string(),
            after_logout: "/".to_string(),
            profile: "/".to_string(),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Session storage.
    pub store: Arc<dyn SessionStore>,
    /// Local user store seam.
    pub directory: Arc<dyn UserDirectory>,
    /// Provider handshake capability.
    pub handshake: Arc<dyn Handshake>,
    /// Registered provider set, slug-sorted, read-only after build.
    pub providers: BTreeMap<&'static str, &'static Provider>,
    /// Redirect targets.
    pub paths: Paths,
    /// Whether cookies carry the Secure flag.
    pub secure_cookies: bool,
}

impl AppState {
    /// Returns the registered provider for a slug.
    #[must_use]
    pub fn registered(&self, slug: &str) -> Option<&'static Provider> {
        self.providers.get(slug).copied()
    }
}

/// Assembles an [`AppState`] from activated providers and collaborators.
///
/// Activation errors surface here, before any route exists; the process
/// must not start with an invalid configuration.
#[derive(Debug)]
pub struct GatewayBuilder {
    registrations: Vec<ProviderRegistration>,
    paths: Paths,
    secure_cookies: bool,
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayBuilder {
    /// Creates a builder with default paths and secure cookies enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            paths: Paths::default(),
            secure_cookies: true,
        }
    }

    /// Sets the post-flow redirect targets.
    #[must_use]
    pub fn paths(mut self, paths: Paths) -> Self {
        self.paths = paths;
        self
    }

    /// Sets whether cookies carry the Secure flag.
    #[must_use]
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// Activates a catalog provider with deployment credentials.
    ///
    /// Derives the callback URL from `callback_base`, merges the provider's
    /// default scopes with `extra_scopes` (union, de-duplicated,
    /// case-normalized), and queues the registration for the handshake
    /// capability.
    ///
    /// # Errors
    ///
    /// - [`ActivationError::InvalidProvider`] if the provider is not
    ///   catalog-listed
    /// - [`ActivationError::InvalidArgument`] if `callback_base` does not
    ///   parse as a URL
    /// - [`ActivationError::MissingSource`] if the provider mandates a
    ///   discovery/source URL and `source` is absent or unparseable
    pub fn provider(
        mut self,
        provider: &'static Provider,
        client_id: &str,
        client_secret: &str,
        callback_base: &str,
        source: Option<&str>,
        extra_scopes: &[String],
    ) -> Result<Self, ActivationError> {
        if !Provider::validate(provider) {
            return Err(ActivationError::InvalidProvider {
                slug: provider.slug().to_string(),
            });
        }

        let source = match source {
            Some(raw) => match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(_) if provider.requires_source() => {
                    return Err(ActivationError::MissingSource {
                        slug: provider.slug().to_string(),
                    });
                }
                Err(err) => {
                    return Err(ActivationError::InvalidArgument {
                        reason: format!("source URL: {err}"),
                    });
                }
            },
            None if provider.requires_source() => {
                return Err(ActivationError::MissingSource {
                    slug: provider.slug().to_string(),
                });
            }
            None => None,
        };

        let mut callback_url =
            Url::parse(callback_base).map_err(|err| ActivationError::InvalidArgument {
                reason: format!("callback base URL: {err}"),
            })?;
        callback_url.set_path(&format!("/auth/callback/{}", provider.slug()));

        self.registrations.push(ProviderRegistration {
            provider,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            callback_url,
            source,
            scopes: provider.merge_scopes(extra_scopes),
        });

        Ok(self)
    }

    /// Registers every queued provider with the handshake capability and
    /// produces the shared state.
    ///
    /// # Errors
    ///
    /// Returns the first activation failure; nothing is served in that case.
    pub async fn build(
        self,
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn UserDirectory>,
        handshake: Arc<dyn Handshake>,
    ) -> Result<Arc<AppState>, ActivationError> {
        let mut providers = BTreeMap::new();
        for registration in self.registrations {
            let provider = registration.provider;
            handshake.activate(registration).await?;
            providers.insert(provider.slug(), provider);
            tracing::info!(provider = provider.slug(), "activated provider");
        }

        Ok(Arc::new(AppState {
            store,
            directory,
            handshake,
            providers,
            paths: self.paths,
            secure_cookies: self.secure_cookies,
        }))
    }
}

/// Builds the gateway router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/add/{provider}", get(routes::add_existing_account))
        .route("/auth/login/{provider}", get(routes::login))
        .route("/auth/callback/{provider}", get(callback::callback))
        .route("/auth/logout", get(routes::logout))
        .route("/auth/providers", get(routes::list_providers))
        .route("/auth/refetch/{provider}", get(routes::refetch))
        .route("/auth/whoami", get(routes::whoami))
        .with_state(state)
}

/// Builds the session cookie for a committed token.
pub(crate) fn session_cookie(
    token: String,
    expires: DateTime<Utc>,
    secure: bool,
) -> Cookie<'static> {
    let max_age = time::Duration::seconds((expires - Utc::now()).num_seconds().max(0));
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Builds a removal cookie: empty value, epoch expiry.
pub(crate) fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_access::{FauxHandshake, MemoryDirectory, MemoryStore, provider};

    fn collaborators() -> (
        Arc<MemoryStore>,
        Arc<MemoryDirectory>,
        Arc<FauxHandshake>,
    ) {
        (
            Arc::new(MemoryStore::new(chrono::Duration::minutes(5))),
            Arc::new(MemoryDirectory::new()),
            Arc::new(FauxHandshake::new()),
        )
    }

    #[test]
    fn activation_rejects_unparseable_callback_base() {
        let err = GatewayBuilder::new()
            .provider(&provider::GOOGLE, "id", "secret", "not a url", None, &[])
            .expect_err("must fail");
        assert!(matches!(err, ActivationError::InvalidArgument { .. }));
    }

    #[test]
    fn activation_requires_source_for_discovery_providers() {
        let err = GatewayBuilder::new()
            .provider(
                &provider::OKTA,
                "id",
                "secret",
                "https://app.example.com",
                None,
                &[],
            )
            .expect_err("must fail");
        assert_eq!(
            err,
            ActivationError::MissingSource {
                slug: "okta".to_string()
            }
        );

        let err = GatewayBuilder::new()
            .provider(
                &provider::OKTA,
                "id",
                "secret",
                "https://app.example.com",
                Some("not a url"),
                &[],
            )
            .expect_err("must fail");
        assert!(matches!(err, ActivationError::MissingSource { .. }));
    }

    #[test]
    fn activation_derives_the_callback_url() {
        let builder = GatewayBuilder::new()
            .provider(
                &provider::GOOGLE,
                "id",
                "secret",
                "https://app.example.com",
                None,
                &[],
            )
            .expect("activation");
        assert_eq!(
            builder.registrations[0].callback_url.as_str(),
            "https://app.example.com/auth/callback/google"
        );
    }

    #[tokio::test]
    async fn build_produces_a_slug_sorted_registered_set() {
        let (store, directory, handshake) = collaborators();
        let state = GatewayBuilder::new()
            .provider(
                &provider::GOOGLE,
                "id",
                "secret",
                "https://app.example.com",
                None,
                &[],
            )
            .expect("google")
            .provider(
                &provider::FAUX,
                "id",
                "secret",
                "https://app.example.com",
                None,
                &[],
            )
            .expect("faux")
            .build(store, directory, handshake)
            .await
            .expect("build");

        let slugs: Vec<_> = state.providers.keys().copied().collect();
        assert_eq!(slugs, vec!["faux", "google"]);
        assert!(state.registered("google").is_some());
        assert!(state.registered("github").is_none());
    }
}
