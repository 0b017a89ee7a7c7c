//! Flow controller routes.
//!
//! These handlers start handshakes and answer identity queries; the
//! completion side lives in [`callback`](crate::auth::callback). Every
//! handler that starts a round-trip records the provider (and, for the
//! linking and refetch flows, the pending sub-flow) in the session before
//! redirecting the browser to the provider.

use crate::auth::middleware::{GatewaySession, MaybePrincipal, RequirePrincipal};
use crate::auth::{AppState, FLOW_COOKIE, PROVIDER_COOKIE, session_cookie};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use gatehouse_access::{CallbackParams, HandshakeError, PendingFlow, SessionError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Errors a flow-controller handler can answer with.
#[derive(Debug)]
pub enum AuthError {
    /// The path names a provider that is not activated.
    UnknownProvider { slug: String },
    /// Building the authorization URL failed.
    Handshake(HandshakeError),
    /// The session could not be made durable.
    SessionCommit(SessionError),
    /// The route demands a state the session is not in.
    NotAllowed,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownProvider { slug } => write!(f, "unknown provider '{slug}'"),
            Self::Handshake(err) => write!(f, "{err}"),
            Self::SessionCommit(err) => write!(f, "{err}"),
            Self::NotAllowed => write!(f, "not allowed in the current session state"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownProvider { .. } => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            Self::Handshake(_) | Self::SessionCommit(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::NotAllowed => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// One row of the provider listing.
#[derive(Debug, Serialize)]
pub struct ProviderListing {
    slug: &'static str,
    label: &'static str,
}

/// `GET /auth/providers` — the activated providers, slug-sorted.
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderListing>> {
    let listing = state
        .providers
        .values()
        .map(|p| ProviderListing {
            slug: p.slug(),
            label: p.label(),
        })
        .collect();
    Json(listing)
}

/// `GET /auth/login/{provider}` — starts (or inline-completes) a login.
///
/// A request that already carries a completable assertion for the session's
/// pending attempt is finished on the spot and redirected onward; anything
/// else begins a fresh round-trip with the provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<CallbackParams>,
    GatewaySession(mut session): GatewaySession,
) -> Result<Response, AuthError> {
    let provider = state
        .registered(&slug)
        .ok_or_else(|| AuthError::UnknownProvider { slug: slug.clone() })?;

    if params.has_code() {
        let mut working = session.data().clone();
        match state
            .handshake
            .complete(provider.slug(), &params, &mut working)
            .await
        {
            Ok(identity) => {
                tracing::debug!(provider = %slug, subject = %identity.subject, "login completed inline");
                return Ok(Redirect::to(&state.paths.after_login).into_response());
            }
            Err(err) => {
                tracing::debug!(provider = %slug, error = %err, "inline completion failed, starting fresh");
            }
        }
    }

    let url = state
        .handshake
        .authorization_url(provider.slug(), session.data_mut())
        .await
        .map_err(AuthError::Handshake)?;
    session.data_mut().set_provider(provider.slug());

    let (token, expires) = session.commit().await.map_err(AuthError::SessionCommit)?;
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(flow_marker(PROVIDER_COOKIE, provider.slug(), state.secure_cookies));

    tracing::info!(provider = %slug, "starting login handshake");
    Ok((jar, Redirect::temporary(&url)).into_response())
}

/// `GET /auth/logout` — ends the session.
///
/// Provider-side revocation is best effort; the local session is destroyed
/// unconditionally and the browser always lands on the post-logout page.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    RequirePrincipal(principal): RequirePrincipal,
    GatewaySession(mut session): GatewaySession,
) -> Response {
    if let Some(slug) = session.data().provider().map(str::to_string) {
        if let Err(err) = state.handshake.revoke(&slug, session.data()).await {
            tracing::warn!(provider = %slug, error = %err, "provider revocation failed");
        }
    }

    if let Err(err) = session.destroy().await {
        tracing::warn!(error = %err, "failed to destroy session record");
    }
    tracing::info!(user_id = principal.user_id(), "session ended");

    let jar = CookieJar::new()
        .add(super::removal_cookie(super::SESSION_COOKIE))
        .add(super::removal_cookie(PROVIDER_COOKIE))
        .add(super::removal_cookie(FLOW_COOKIE));
    (jar, Redirect::to(&state.paths.after_logout)).into_response()
}

/// `GET /auth/add/{provider}` — links another provider identity.
///
/// The caller must hold an identity (a bearer token in practice) while the
/// browser session itself is unauthenticated; the handshake runs in that
/// anonymous session and the addition callback attaches the new subject to
/// the caller's account.
pub async fn add_existing_account(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    RequirePrincipal(principal): RequirePrincipal,
    GatewaySession(mut session): GatewaySession,
) -> Result<Response, AuthError> {
    let provider = state
        .registered(&slug)
        .ok_or_else(|| AuthError::UnknownProvider { slug: slug.clone() })?;

    if session.data().user_id().is_some_and(|id| !id.is_empty()) {
        tracing::info!(
            user_id = principal.user_id(),
            "refused account linking in an authenticated session"
        );
        return Err(AuthError::NotAllowed);
    }

    let url = state
        .handshake
        .authorization_url(provider.slug(), session.data_mut())
        .await
        .map_err(AuthError::Handshake)?;
    session.data_mut().set_provider(provider.slug());
    session.data_mut().set_flow(PendingFlow::Addition);

    let (token, expires) = session.commit().await.map_err(AuthError::SessionCommit)?;
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(flow_marker(PROVIDER_COOKIE, provider.slug(), state.secure_cookies))
        .add(flow_marker(FLOW_COOKIE, "addition", state.secure_cookies));

    tracing::info!(provider = %slug, user_id = principal.user_id(), "starting account-linking handshake");
    Ok((jar, Redirect::temporary(&url)).into_response())
}

/// `GET /auth/refetch/{provider}` — refreshes profile attributes.
///
/// Starts a round-trip whose callback updates the stored email and display
/// name instead of creating anything.
pub async fn refetch(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    RequirePrincipal(principal): RequirePrincipal,
    GatewaySession(mut session): GatewaySession,
) -> Result<Response, AuthError> {
    let provider = state
        .registered(&slug)
        .ok_or_else(|| AuthError::UnknownProvider { slug: slug.clone() })?;

    let url = state
        .handshake
        .authorization_url(provider.slug(), session.data_mut())
        .await
        .map_err(AuthError::Handshake)?;
    session.data_mut().set_provider(provider.slug());
    session.data_mut().set_flow(PendingFlow::Refetch);

    let (token, expires) = session.commit().await.map_err(AuthError::SessionCommit)?;
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(flow_marker(PROVIDER_COOKIE, provider.slug(), state.secure_cookies))
        .add(flow_marker(FLOW_COOKIE, "refetch", state.secure_cookies));

    tracing::info!(provider = %slug, user_id = principal.user_id(), "starting refetch handshake");
    Ok((jar, Redirect::temporary(&url)).into_response())
}

/// `GET /auth/whoami` — the caller's user record.
///
/// Requires both a principal and a server-side session the directory still
/// recognizes; a cookie that outlived its directory binding answers 401.
pub async fn whoami(
    State(state): State<Arc<AppState>>,
    MaybePrincipal(principal): MaybePrincipal,
    GatewaySession(session): GatewaySession,
) -> Response {
    let Some(principal) = principal else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let token = session.token().unwrap_or_default();
    match state
        .directory
        .user_with_session(principal.user_id(), token)
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => {
            tracing::debug!(user_id = principal.user_id(), error = %err, "whoami lookup failed");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Builds a flow-marker cookie mirroring session state for the browser.
fn flow_marker(name: &'static str, value: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}
