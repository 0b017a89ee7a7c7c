//! The callback state machine.
//!
//! All providers share one callback endpoint. The session's pending-flow
//! marker, taken exactly once, selects the sub-flow:
//!
//! - no marker: **login** — reconcile the asserted identity against the
//!   directory and authenticate the session
//! - `refetch`: refresh the stored email and display name
//! - `addition`: link the asserted identity to the caller's account as a
//!   secondary connection
//!
//! Every sub-flow renews the session token before completing the provider
//! exchange, so a token planted before the round-trip never survives it.
//! Every failure scrubs the session, provider, and pending-flow cookies and
//! answers with a client error carrying the reason as plain text; stale flow
//! state must not survive into a retry.

use crate::auth::middleware::{GatewaySession, bearer_user_id};
use crate::auth::routes::AuthError;
use crate::auth::{
    AppState, FLOW_COOKIE, PROVIDER_COOKIE, SESSION_COOKIE, removal_cookie, session_cookie,
};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use gatehouse_access::{CallbackParams, PendingFlow, ProviderIdentity, SessionHandle};
use std::sync::Arc;

/// `GET /auth/callback/{provider}` — completes a pending handshake.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
    GatewaySession(mut session): GatewaySession,
) -> Response {
    if state.registered(&slug).is_none() {
        return AuthError::UnknownProvider { slug }.into_response();
    }

    // Popped through the store, so a retried or duplicated callback never
    // runs the same sub-flow twice.
    let flow = match session.take_flow().await {
        Ok(flow) => flow,
        Err(err) => return failure(&slug, &format!("pending flow: {err}")),
    };

    // A token planted before the provider round-trip must not become an
    // authenticated token.
    if let Err(err) = session.renew().await {
        return failure(&slug, &format!("session renewal: {err}"));
    }

    let identity = match state
        .handshake
        .complete(&slug, &params, session.data_mut())
        .await
    {
        Ok(identity) => identity,
        Err(err) => return failure(&slug, &err.to_string()),
    };

    let outcome = match flow {
        None => login(&state, &slug, &identity, &mut session).await,
        Some(PendingFlow::Refetch) => refetch(&state, &slug, &identity, &mut session).await,
        Some(PendingFlow::Addition) => {
            addition(&state, &slug, &identity, &headers, &mut session).await
        }
    };

    match outcome {
        Ok(response) => response,
        Err(reason) => failure(&slug, &reason),
    }
}

/// Login sub-flow: reconcile the identity and authenticate the session.
async fn login(
    state: &AppState,
    slug: &str,
    identity: &ProviderIdentity,
    session: &mut SessionHandle,
) -> Result<Response, String> {
    let user_id = state
        .directory
        .create_or_update(&identity.subject, slug, &identity.email, &identity.name)
        .await
        .map_err(|err| format!("create or update user: {err}"))?;
    if user_id.is_empty() {
        return Err("directory returned an empty user id".to_string());
    }

    match state.directory.is_disabled(&user_id).await {
        Ok(false) => {}
        Ok(true) => {
            tracing::info!(user_id, provider = slug, "login refused: account disabled");
            return Err("account is disabled".to_string());
        }
        Err(err) => {
            tracing::warn!(
                user_id,
                provider = slug,
                error = %err,
                "login refused: disabled check failed"
            );
            return Err(format!("disabled check: {err}"));
        }
    }

    session.data_mut().set_user_id(&user_id);
    session.data_mut().set_provider(slug);
    let (token, expires) = session
        .commit()
        .await
        .map_err(|err| format!("session commit: {err}"))?;

    // The directory must recognize the durable token, or whoami stays 401.
    state
        .directory
        .bind_session(&identity.subject, &token)
        .await
        .map_err(|err| format!("bind session: {err}"))?;

    tracing::info!(user_id, provider = slug, "login completed");
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(removal_cookie(FLOW_COOKIE));
    Ok((jar, Redirect::to(&state.paths.after_login)).into_response())
}

/// Refetch sub-flow: refresh email and display name for a linked identity.
async fn refetch(
    state: &AppState,
    slug: &str,
    identity: &ProviderIdentity,
    session: &mut SessionHandle,
) -> Result<Response, String> {
    let user_id = state
        .directory
        .user_id_for_subject(&identity.subject)
        .await
        .map_err(|err| format!("resolve subject: {err}"))?;
    state
        .directory
        .update_info(&user_id, &identity.email, &identity.name)
        .await
        .map_err(|err| format!("update info: {err}"))?;

    let (token, expires) = session
        .commit()
        .await
        .map_err(|err| format!("session commit: {err}"))?;
    state
        .directory
        .bind_session(&identity.subject, &token)
        .await
        .map_err(|err| format!("bind session: {err}"))?;

    tracing::info!(user_id, provider = slug, "profile attributes refetched");
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(removal_cookie(FLOW_COOKIE));
    Ok((jar, Redirect::to(&state.paths.profile)).into_response())
}

/// Addition sub-flow: link the asserted identity to the caller's account.
///
/// The browser session must be anonymous; the account to link against comes
/// from the caller's bearer token.
async fn addition(
    state: &AppState,
    slug: &str,
    identity: &ProviderIdentity,
    headers: &HeaderMap,
    session: &mut SessionHandle,
) -> Result<Response, String> {
    if session.data().user_id().is_some_and(|id| !id.is_empty()) {
        return Err("session is already authenticated".to_string());
    }

    let user_id = bearer_user_id(headers, state.directory.as_ref())
        .await
        .map_err(|_| "bearer token did not resolve".to_string())?
        .ok_or_else(|| "account linking requires a bearer identity".to_string())?;

    state
        .directory
        .create_connection(&identity.subject, slug)
        .await
        .map_err(|err| format!("create connection: {err}"))?;
    state
        .directory
        .attach_connection(&user_id, &identity.subject)
        .await
        .map_err(|err| format!("attach connection: {err}"))?;

    let (token, expires) = session
        .commit()
        .await
        .map_err(|err| format!("session commit: {err}"))?;

    tracing::info!(
        user_id,
        provider = slug,
        subject = %identity.subject,
        "provider identity linked"
    );
    let jar = CookieJar::new()
        .add(session_cookie(token, expires, state.secure_cookies))
        .add(removal_cookie(FLOW_COOKIE));
    Ok((jar, Redirect::to(&state.paths.profile)).into_response())
}

/// Uniform failure response: scrub the flow cookies, answer 400 with the
/// reason as plain text.
fn failure(slug: &str, reason: &str) -> Response {
    tracing::error!(provider = slug, error = reason, "callback flow failed");
    let jar = CookieJar::new()
        .add(removal_cookie(SESSION_COOKIE))
        .add(removal_cookie(PROVIDER_COOKIE))
        .add(removal_cookie(FLOW_COOKIE));
    (StatusCode::BAD_REQUEST, jar, reason.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use crate::auth::middleware::bearer_user_id;
    use crate::auth::{GatewayBuilder, router};
    use axum::Router;
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};
    use axum_extra::extract::cookie::Cookie;
    use gatehouse_access::{
        FauxHandshake, Handshake, MemoryDirectory, MemoryStore, PendingFlow, ProviderIdentity,
        SessionData, SessionStore, UserDirectory, provider,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<MemoryStore>,
        directory: Arc<MemoryDirectory>,
        handshake: Arc<FauxHandshake>,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new(chrono::Duration::minutes(5)));
        let directory = Arc::new(MemoryDirectory::new());
        let handshake = Arc::new(FauxHandshake::new());
        let state = GatewayBuilder::new()
            .secure_cookies(false)
            .provider(
                &provider::FAUX,
                "id",
                "secret",
                "http://app.example.com",
                None,
                &[],
            )
            .expect("faux")
            .provider(
                &provider::GOOGLE,
                "id",
                "secret",
                "http://app.example.com",
                None,
                &[],
            )
            .expect("google")
            .build(store.clone(), directory.clone(), handshake.clone())
            .await
            .expect("build");
        Harness {
            app: router(state),
            store,
            directory,
            handshake,
        }
    }

    fn identity(subject: &str, email: &str, name: &str) -> ProviderIdentity {
        ProviderIdentity {
            subject: subject.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    async fn get(
        app: &Router,
        uri: &str,
        session: Option<&str>,
        bearer: Option<&str>,
    ) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(token) = session {
            request = request.header(header::COOKIE, format!("session={token}"));
        }
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        app.clone()
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    fn cookie_value(response: &axum::response::Response, name: &str) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| Cookie::parse(v.to_string()).ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn location(response: &axum::response::Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .expect("location header")
            .to_str()
            .expect("ascii location")
            .to_string()
    }

    /// Runs a full login round-trip and returns the authenticated cookie.
    async fn log_in(h: &Harness, subject: &str, email: &str, name: &str) -> String {
        h.handshake.queue(identity(subject, email, name)).await;

        let start = get(&h.app, "/auth/login/faux", None, None).await;
        assert_eq!(start.status(), StatusCode::TEMPORARY_REDIRECT);
        let pending = cookie_value(&start, "session").expect("pending session cookie");

        let finish = get(
            &h.app,
            "/auth/callback/faux?code=x",
            Some(&pending),
            None,
        )
        .await;
        assert_eq!(finish.status(), StatusCode::SEE_OTHER, "callback must succeed");
        let authed = cookie_value(&finish, "session").expect("renewed session cookie");
        assert_ne!(authed, pending, "callback must renew the session token");
        authed
    }

    async fn whoami(h: &Harness, session: Option<&str>) -> (StatusCode, String) {
        let response = get(&h.app, "/auth/whoami", session, None).await;
        let status = response.status();
        (status, body_text(response).await)
    }

    #[tokio::test]
    async fn whoami_without_identity_is_unauthorized_and_empty() {
        let h = harness().await;
        let (status, body) = whoami(&h, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn provider_listing_is_slug_sorted() {
        let h = harness().await;
        let response = get(&h.app, "/auth/providers", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let listing: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        let slugs: Vec<_> = listing
            .as_array()
            .expect("array")
            .iter()
            .map(|row| row["slug"].as_str().expect("slug"))
            .collect();
        assert_eq!(slugs, vec!["faux", "google"]);
        assert_eq!(listing[0]["label"], "Faux");
    }

    #[tokio::test]
    async fn login_round_trip_authenticates_the_browser() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;

        let (status, body) = whoami(&h, Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        let record: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(record["email"], "a@example.com");
        assert_eq!(record["name"], "Ada");
        assert_eq!(record["disabled"], false);
    }

    #[tokio::test]
    async fn login_with_unknown_provider_is_not_found() {
        let h = harness().await;
        let response = get(&h.app, "/auth/login/myspace", None, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_is_idempotent_on_the_provider_subject() {
        let h = harness().await;
        let first = log_in(&h, "user-42", "a@example.com", "Ada").await;
        let (_, body) = whoami(&h, Some(&first)).await;
        let first_id = serde_json::from_str::<serde_json::Value>(&body).expect("json")["id"]
            .as_str()
            .expect("id")
            .to_string();

        let second = log_in(&h, "user-42", "b@example.com", "Beth").await;
        let (status, body) = whoami(&h, Some(&second)).await;
        assert_eq!(status, StatusCode::OK);
        let record: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(record["id"], first_id.as_str());
        assert_eq!(record["email"], "b@example.com");
        assert_eq!(record["name"], "Beth");
    }

    #[tokio::test]
    async fn login_completes_inline_when_the_request_carries_an_assertion() {
        let h = harness().await;
        h.handshake
            .queue(identity("user-42", "a@example.com", "Ada"))
            .await;

        let mut data = SessionData::default();
        h.handshake
            .authorization_url("faux", &mut data)
            .await
            .expect("start");
        h.store.commit("pending", &data).await.expect("commit");

        let response = get(&h.app, "/auth/login/faux?code=x", Some("pending"), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn disabled_account_cannot_complete_login() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;
        let (_, body) = whoami(&h, Some(&cookie)).await;
        let user_id = serde_json::from_str::<serde_json::Value>(&body).expect("json")["id"]
            .as_str()
            .expect("id")
            .to_string();
        h.directory
            .set_disabled(&user_id, true)
            .await
            .expect("disable");

        h.handshake
            .queue(identity("user-42", "a@example.com", "Ada"))
            .await;
        let start = get(&h.app, "/auth/login/faux", None, None).await;
        let pending = cookie_value(&start, "session").expect("pending cookie");
        let finish = get(&h.app, "/auth/callback/faux?code=x", Some(&pending), None).await;

        assert_eq!(finish.status(), StatusCode::BAD_REQUEST);
        // All three flow cookies are scrubbed.
        for name in ["session", "provider", "pending_flow"] {
            assert_eq!(cookie_value(&finish, name), Some(String::new()), "{name}");
        }
        // The failed attempt's session never became authenticated.
        let (status, _) = whoami(&h, Some(&pending)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body_text(finish).await.contains("disabled"));
    }

    #[tokio::test]
    async fn directory_outage_during_login_fails_closed() {
        let h = harness().await;
        h.handshake
            .queue(identity("user-42", "a@example.com", "Ada"))
            .await;
        let start = get(&h.app, "/auth/login/faux", None, None).await;
        let pending = cookie_value(&start, "session").expect("pending cookie");

        h.directory.fail_lookups(true);
        let finish = get(&h.app, "/auth/callback/faux?code=x", Some(&pending), None).await;
        assert_eq!(finish.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn callback_with_nothing_pending_fails() {
        let h = harness().await;
        let response = get(&h.app, "/auth/callback/faux?code=x", None, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("no pending"));
    }

    #[tokio::test]
    async fn logout_invalidates_the_session_even_when_revocation_fails() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;

        h.handshake.fail_revoke(true);
        let response = get(&h.app, "/auth/logout", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(cookie_value(&response, "session"), Some(String::new()));

        let (status, _) = whoami(&h, Some(&cookie)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_requires_an_identity() {
        let h = harness().await;
        let response = get(&h.app, "/auth/logout", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_with_the_provider_when_it_can() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;
        get(&h.app, "/auth/logout", Some(&cookie), None).await;
        assert_eq!(h.handshake.revocations().await, vec!["faux".to_string()]);
    }

    #[tokio::test]
    async fn refetch_updates_attributes_without_changing_the_user_id() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;
        let (_, body) = whoami(&h, Some(&cookie)).await;
        let user_id = serde_json::from_str::<serde_json::Value>(&body).expect("json")["id"]
            .as_str()
            .expect("id")
            .to_string();

        h.handshake
            .queue(identity("user-42", "ada@new.example.com", "Ada Lovelace"))
            .await;
        let start = get(&h.app, "/auth/refetch/faux", Some(&cookie), None).await;
        assert_eq!(start.status(), StatusCode::TEMPORARY_REDIRECT);
        let pending = cookie_value(&start, "session").expect("session cookie");

        let finish = get(&h.app, "/auth/callback/faux?code=x", Some(&pending), None).await;
        assert_eq!(finish.status(), StatusCode::SEE_OTHER);
        let refreshed = cookie_value(&finish, "session").expect("renewed cookie");

        let (status, body) = whoami(&h, Some(&refreshed)).await;
        assert_eq!(status, StatusCode::OK);
        let record: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(record["id"], user_id.as_str());
        assert_eq!(record["email"], "ada@new.example.com");
        assert_eq!(record["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn refetch_requires_an_identity() {
        let h = harness().await;
        let response = get(&h.app, "/auth/refetch/faux", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn linking_attaches_a_secondary_connection() {
        let h = harness().await;
        let user_id = h
            .directory
            .create_or_update("primary", "google", "a@example.com", "Ada")
            .await
            .expect("create");
        let bearer = h.directory.issue_token(&user_id).await.expect("token");

        // Anonymous browser session, bearer-authenticated caller.
        let start = get(&h.app, "/auth/add/faux", None, Some(&bearer)).await;
        assert_eq!(start.status(), StatusCode::TEMPORARY_REDIRECT);
        let pending = cookie_value(&start, "session").expect("session cookie");
        assert_eq!(
            cookie_value(&start, "pending_flow"),
            Some("addition".to_string())
        );

        h.handshake
            .queue(identity("secondary", "a@example.com", "Ada"))
            .await;
        let finish = get(
            &h.app,
            "/auth/callback/faux?code=x",
            Some(&pending),
            Some(&bearer),
        )
        .await;
        assert_eq!(finish.status(), StatusCode::SEE_OTHER);

        let connections = h.directory.connections(&user_id).await;
        assert!(connections.contains(&("faux".to_string(), "secondary".to_string())));
    }

    #[tokio::test]
    async fn linking_start_refuses_an_authenticated_session() {
        let h = harness().await;
        let cookie = log_in(&h, "user-42", "a@example.com", "Ada").await;
        let response = get(&h.app, "/auth/add/faux", Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn linking_callback_refuses_an_authenticated_session() {
        let h = harness().await;
        let user_id = h
            .directory
            .create_or_update("primary", "google", "a@example.com", "Ada")
            .await
            .expect("create");
        let bearer = h.directory.issue_token(&user_id).await.expect("token");

        // A session that is both authenticated and mid-addition cannot be
        // produced by the start handler; plant one directly.
        let mut data = SessionData::default();
        h.handshake
            .authorization_url("faux", &mut data)
            .await
            .expect("start");
        data.set_user_id(&user_id);
        data.set_flow(PendingFlow::Addition);
        h.store.commit("planted", &data).await.expect("commit");

        h.handshake
            .queue(identity("secondary", "a@example.com", "Ada"))
            .await;
        let finish = get(
            &h.app,
            "/auth/callback/faux?code=x",
            Some("planted"),
            Some(&bearer),
        )
        .await;
        assert_eq!(finish.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(finish).await.contains("already authenticated"));
        assert!(h.directory.connections(&user_id).await.len() == 1);
    }

    #[tokio::test]
    async fn bearer_identity_outranks_the_session_cookie() {
        let h = harness().await;
        let cookie = log_in(&h, "sub-a", "a@example.com", "Ada").await;

        let beth = h
            .directory
            .create_or_update("sub-b", "google", "b@example.com", "Beth")
            .await
            .expect("create");
        let bearer = h.directory.issue_token(&beth).await.expect("token");
        // Let the directory accept the cookie's token for Beth too, so the
        // record in the response tells the two sources apart.
        h.directory
            .bind_session("sub-b", &cookie)
            .await
            .expect("bind");

        let response = get(&h.app, "/auth/whoami", Some(&cookie), Some(&bearer)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        assert_eq!(record["id"], beth.as_str());
        assert_eq!(record["email"], "b@example.com");
    }

    #[tokio::test]
    async fn pending_assertion_yields_an_identity_outside_the_callback() {
        let h = harness().await;
        let user_id = h
            .directory
            .create_or_update("sub-9", "faux", "i@example.com", "Ida")
            .await
            .expect("create");
        h.handshake
            .queue(identity("sub-9", "i@example.com", "Ida"))
            .await;

        // A committed session holding only the pending attempt.
        let mut data = SessionData::default();
        h.handshake
            .authorization_url("faux", &mut data)
            .await
            .expect("start");
        data.set_provider("faux");
        h.store.commit("pending", &data).await.expect("commit");
        h.directory
            .bind_session("sub-9", "pending")
            .await
            .expect("bind");

        let response = get(&h.app, "/auth/whoami?code=x", Some("pending"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let record: serde_json::Value =
            serde_json::from_str(&body_text(response).await).expect("json");
        assert_eq!(record["id"], user_id.as_str());
    }

    #[tokio::test]
    async fn bearer_identities_do_not_cross_talk() {
        let h = harness().await;
        let ada = h
            .directory
            .create_or_update("sub-a", "google", "a@example.com", "Ada")
            .await
            .expect("create");
        let beth = h
            .directory
            .create_or_update("sub-b", "google", "b@example.com", "Beth")
            .await
            .expect("create");
        let token_a = h.directory.issue_token(&ada).await.expect("token");
        let token_b = h.directory.issue_token(&beth).await.expect("token");

        let bearer_headers = |token: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::AUTHORIZATION,
                format!("Bearer {token}").parse().expect("header"),
            );
            headers
        };
        let headers_a = bearer_headers(&token_a);
        let headers_b = bearer_headers(&token_b);

        let (left, right) = tokio::join!(
            bearer_user_id(&headers_a, h.directory.as_ref()),
            bearer_user_id(&headers_b, h.directory.as_ref()),
        );
        assert_eq!(left.expect("resolve").as_deref(), Some(ada.as_str()));
        assert_eq!(right.expect("resolve").as_deref(), Some(beth.as_str()));
    }
}
