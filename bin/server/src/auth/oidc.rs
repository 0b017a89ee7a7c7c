//! OIDC handshake implementation using the openidconnect crate.
//!
//! One `OidcHandshake` owns the client registrations for one gateway
//! instance. Activation discovers the provider's metadata from its issuer
//! (the catalog's well-known issuer, or the deployment-supplied source URL
//! for providers that mandate one); the round-trip uses the authorization
//! code flow with PKCE, with the CSRF state, PKCE verifier, and nonce held
//! in the caller's session between redirect and callback.

use async_trait::async_trait;
use gatehouse_access::{
    ActivationError, CallbackParams, Handshake, HandshakeError, ProviderIdentity,
    ProviderRegistration, SessionData,
};
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet, EndpointNotSet,
    EndpointSet, IssuerUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session key holding the pending CSRF state.
const STATE_KEY: &str = "oidc_state";

/// Session key holding the pending PKCE verifier.
const PKCE_KEY: &str = "oidc_pkce";

/// Session key holding the pending ID-token nonce.
const NONCE_KEY: &str = "oidc_nonce";

struct Registered {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    scopes: Vec<String>,
}

type ConfiguredClient = CoreClient<
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointMaybeSet,
    EndpointMaybeSet,
>;

impl Registered {
    fn client(&self) -> ConfiguredClient {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }
}

/// Instance-owned OIDC handshake capability.
pub struct OidcHandshake {
    http: reqwest::Client,
    clients: RwLock<HashMap<String, Registered>>,
}

impl OidcHandshake {
    /// Creates the capability with a non-redirecting HTTP client.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ActivationError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| ActivationError::InvalidArgument {
                reason: format!("http client: {err}"),
            })?;
        Ok(Self {
            http,
            clients: RwLock::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl Handshake for OidcHandshake {
    async fn activate(&self, registration: ProviderRegistration) -> Result<(), ActivationError> {
        let slug = registration.provider.slug();

        let issuer = match &registration.source {
            Some(source) => source.to_string(),
            None => registration
                .provider
                .issuer()
                .map(str::to_string)
                .ok_or_else(|| ActivationError::Registration {
                    slug: slug.to_string(),
                    reason: "no issuer known and no source URL given".to_string(),
                })?,
        };
        let issuer_url =
            IssuerUrl::new(issuer).map_err(|err| ActivationError::Registration {
                slug: slug.to_string(),
                reason: format!("invalid issuer URL: {err}"),
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &self.http)
            .await
            .map_err(|err| ActivationError::Registration {
                slug: slug.to_string(),
                reason: format!("discovery failed: {err}"),
            })?;

        let redirect_url = RedirectUrl::new(registration.callback_url.to_string()).map_err(
            |err| ActivationError::Registration {
                slug: slug.to_string(),
                reason: format!("invalid redirect URL: {err}"),
            },
        )?;

        self.clients.write().await.insert(
            slug.to_string(),
            Registered {
                provider_metadata,
                client_id: ClientId::new(registration.client_id),
                client_secret: ClientSecret::new(registration.client_secret),
                redirect_url,
                scopes: registration.scopes,
            },
        );
        Ok(())
    }

    async fn authorization_url(
        &self,
        slug: &str,
        session: &mut SessionData,
    ) -> Result<String, HandshakeError> {
        let clients = self.clients.read().await;
        let registered = clients.get(slug).ok_or_else(|| HandshakeError::NotRegistered {
            slug: slug.to_string(),
        })?;
        let client = registered.client();

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);
        for scope in &registered.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }
        let (url, csrf_token, nonce) = request.url();

        session.set_handshake_value(STATE_KEY, csrf_token.secret().clone());
        session.set_handshake_value(PKCE_KEY, pkce_verifier.secret().clone());
        session.set_handshake_value(NONCE_KEY, nonce.secret().clone());

        Ok(url.to_string())
    }

    async fn complete(
        &self,
        slug: &str,
        params: &CallbackParams,
        session: &mut SessionData,
    ) -> Result<ProviderIdentity, HandshakeError> {
        let exchange_err = |reason: String| HandshakeError::Exchange {
            slug: slug.to_string(),
            reason,
        };

        let clients = self.clients.read().await;
        let registered = clients.get(slug).ok_or_else(|| HandshakeError::NotRegistered {
            slug: slug.to_string(),
        })?;

        let Some(code) = &params.code else {
            return Err(HandshakeError::NoPendingAttempt);
        };
        let (Some(expected_state), Some(pkce_verifier), Some(nonce)) = (
            session.take_handshake_value(STATE_KEY),
            session.take_handshake_value(PKCE_KEY),
            session.take_handshake_value(NONCE_KEY),
        ) else {
            return Err(HandshakeError::NoPendingAttempt);
        };

        match &params.state {
            Some(state) if *state == expected_state => {}
            _ => return Err(exchange_err("state mismatch".to_string())),
        }

        let client = registered.client();
        let token_response = client
            .exchange_code(AuthorizationCode::new(code.clone()))
            .map_err(|err| exchange_err(format!("token endpoint: {err}")))?
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|err| exchange_err(format!("token exchange: {err}")))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| exchange_err("no ID token in response".to_string()))?;
        let claims = id_token
            .claims(&client.id_token_verifier(), &Nonce::new(nonce))
            .map_err(|err| exchange_err(format!("ID token validation: {err}")))?;

        let subject = claims.subject().to_string();
        let email = claims
            .email()
            .map(|e| e.as_str().to_string())
            .unwrap_or_default();
        let name = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()))
            .unwrap_or_default();

        Ok(ProviderIdentity {
            subject,
            email,
            name,
        })
    }

    async fn revoke(&self, slug: &str, _session: &SessionData) -> Result<(), HandshakeError> {
        // Provider-side logout endpoints are not part of the exchange; local
        // session destruction is the caller's responsibility.
        tracing::debug!(provider = slug, "no provider-side revocation performed");
        Ok(())
    }
}
