//! Identity extractors.
//!
//! Every identity-aware route derives a [`Principal`] through the same
//! three-stage chain, in fixed precedence:
//!
//! 1. Bearer token from the `Authorization` header. A header that is present
//!    but does not resolve rejects the request outright; it never falls
//!    through to weaker sources.
//! 2. Authenticated session from the session cookie.
//! 3. Inline provider assertion: when the session names a provider and the
//!    request carries completable callback parameters, the handshake is
//!    completed against a working copy of the session. Any failure here
//!    falls through silently.
//!
//! The first stage that produces an identity wins; later stages never
//! overwrite it.

use crate::auth::{AppState, SESSION_COOKIE};
use axum::extract::{FromRequestParts, Query};
use axum::http::{HeaderMap, StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use gatehouse_access::{
    CallbackParams, DirectoryError, Principal, PrincipalSource, SessionHandle, UserDirectory,
};
use std::sync::Arc;

/// Rejection for the identity extractors: an empty 401.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

/// The request's session, attached from the session cookie.
///
/// Requests without a cookie (or with a stale one) get a fresh anonymous
/// session; nothing is persisted until a handler commits.
pub struct GatewaySession(pub SessionHandle);

impl FromRequestParts<Arc<AppState>> for GatewaySession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let handle = SessionHandle::attach(Arc::clone(&state.store), token.as_deref()).await;
        Ok(Self(handle))
    }
}

/// The request's principal, if any source yields one.
///
/// Extraction only fails when a bearer token is present but invalid;
/// everything else resolves to `MaybePrincipal(None)`.
pub struct MaybePrincipal(pub Option<Principal>);

impl FromRequestParts<Arc<AppState>> for MaybePrincipal {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Stage 1: bearer token.
        if let Some(user_id) = bearer_user_id(&parts.headers, state.directory.as_ref()).await? {
            return Ok(Self(Some(Principal::new(user_id, PrincipalSource::Bearer))));
        }

        let GatewaySession(session) = GatewaySession::from_request_parts(parts, state).await?;

        // Stage 2: authenticated session.
        if let Some(user_id) = session.data().user_id() {
            return Ok(Self(Some(Principal::new(
                user_id,
                PrincipalSource::Session,
            ))));
        }

        // Stage 3: inline provider assertion. Works on a copy of the session
        // record so a failed attempt leaves the store untouched.
        let Some(slug) = session.data().provider().map(str::to_string) else {
            return Ok(Self(None));
        };
        let Ok(Query(params)) = Query::<CallbackParams>::try_from_uri(&parts.uri) else {
            return Ok(Self(None));
        };
        if !params.has_code() {
            return Ok(Self(None));
        }

        let mut working = session.data().clone();
        match state.handshake.complete(&slug, &params, &mut working).await {
            Ok(identity) => match state.directory.user_id_for_subject(&identity.subject).await {
                Ok(user_id) => Ok(Self(Some(Principal::new(
                    user_id,
                    PrincipalSource::Assertion,
                )))),
                Err(err) => {
                    tracing::debug!(provider = %slug, error = %err, "inline assertion matched no user");
                    Ok(Self(None))
                }
            },
            Err(err) => {
                tracing::debug!(provider = %slug, error = %err, "inline assertion did not complete");
                Ok(Self(None))
            }
        }
    }
}

/// Gate for routes that demand an identity.
///
/// Absent principals reject with 401. So do disabled accounts, and accounts
/// whose disabled status cannot be determined: an unreachable directory
/// locks the gate rather than opening it.
pub struct RequirePrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for RequirePrincipal {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybePrincipal(principal) = MaybePrincipal::from_request_parts(parts, state).await?;
        let Some(principal) = principal else {
            return Err(AuthRejection);
        };

        match state.directory.is_disabled(principal.user_id()).await {
            Ok(false) => Ok(Self(principal)),
            Ok(true) => {
                tracing::info!(user_id = principal.user_id(), "rejected disabled account");
                Err(AuthRejection)
            }
            Err(err) => {
                tracing::warn!(
                    user_id = principal.user_id(),
                    error = %err,
                    "could not determine disabled status, rejecting"
                );
                Err(AuthRejection)
            }
        }
    }
}

/// Resolves the `Authorization: Bearer` header, if present.
///
/// Returns `Ok(None)` when no usable header exists, `Ok(Some(id))` for a
/// valid token, and a rejection when a token is present but bad: a caller
/// who chose bearer authentication gets a definitive answer, not a silent
/// downgrade to the session.
pub(crate) async fn bearer_user_id(
    headers: &HeaderMap,
    directory: &dyn UserDirectory,
) -> Result<Option<String>, AuthRejection> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(value) = value.to_str() else {
        return Ok(None);
    };
    // Either `<scheme> <token>` or a bare token.
    let token = match value.split_once(' ') {
        Some((_scheme, token)) => token.trim(),
        None => value.trim(),
    };
    if token.is_empty() {
        return Ok(None);
    }

    match directory.user_id_for_token(token).await {
        Ok(user_id) => Ok(Some(user_id)),
        Err(DirectoryError::NotFound) => {
            tracing::debug!("bearer token resolved to no user");
            Err(AuthRejection)
        }
        Err(err) => {
            tracing::warn!(error = %err, "bearer token lookup failed, rejecting");
            Err(AuthRejection)
        }
    }
}
