//! Session state for the authentication gateway.
//!
//! A session is a server-side record keyed by an opaque token carried in a
//! cookie. It holds the resolved local user id (absent while anonymous), the
//! provider last used to authenticate, a single pending-flow marker that is
//! taken exactly once, and opaque handshake state owned by the provider
//! exchange (CSRF state, PKCE verifier, nonce).
//!
//! `SessionStore` is the storage seam; `MemoryStore` is the in-process
//! implementation with a TTL and a periodic expiry sweeper. `SessionHandle`
//! is the request-scoped view handlers mutate and commit.

use crate::error::SessionError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, oneshot};

/// The callback sub-flow the session is waiting on.
///
/// A single tagged value makes the three-way callback dispatch exhaustive;
/// the marker is taken (read-and-cleared) exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingFlow {
    /// Re-fetch profile attributes for an already-linked identity.
    Refetch,
    /// Link an additional provider identity to a local account.
    Addition,
}

/// Server-side session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    user_id: Option<String>,
    provider: Option<String>,
    pending_flow: Option<PendingFlow>,
    handshake_state: HashMap<String, String>,
}

impl SessionData {
    /// Returns the resolved local user id, if the session is authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Stores the local user id.
    pub fn set_user_id(&mut self, id: impl Into<String>) {
        self.user_id = Some(id.into());
    }

    /// Returns the provider slug last used to authenticate.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Stores the provider slug.
    pub fn set_provider(&mut self, slug: impl Into<String>) {
        self.provider = Some(slug.into());
    }

    /// Takes the pending-flow marker, clearing it.
    pub fn take_flow(&mut self) -> Option<PendingFlow> {
        self.pending_flow.take()
    }

    /// Returns the pending-flow marker without clearing it.
    #[must_use]
    pub fn flow(&self) -> Option<PendingFlow> {
        self.pending_flow
    }

    /// Sets the pending-flow marker.
    pub fn set_flow(&mut self, flow: PendingFlow) {
        self.pending_flow = Some(flow);
    }

    /// Returns a handshake-state value.
    #[must_use]
    pub fn handshake_value(&self, key: &str) -> Option<&str> {
        self.handshake_state.get(key).map(String::as_str)
    }

    /// Stores a handshake-state value.
    pub fn set_handshake_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.handshake_state.insert(key.into(), value.into());
    }

    /// Takes a handshake-state value, clearing it.
    pub fn take_handshake_value(&mut self, key: &str) -> Option<String> {
        self.handshake_state.remove(key)
    }

    /// Drops all handshake state.
    pub fn clear_handshake_state(&mut self) {
        self.handshake_state.clear();
    }

    /// Returns true if the session holds any handshake state.
    #[must_use]
    pub fn has_handshake_state(&self) -> bool {
        !self.handshake_state.is_empty()
    }
}

/// Storage seam for sessions.
///
/// Implementations must provide read-modify-write atomicity per token; the
/// gateway itself takes no locks.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for a token. Unknown or expired tokens yield `None`.
    async fn load(&self, token: &str) -> Result<Option<SessionData>, SessionError>;

    /// Persists the session under the token, returning the new expiry.
    async fn commit(&self, token: &str, data: &SessionData)
    -> Result<DateTime<Utc>, SessionError>;

    /// Removes the session for a token. Unknown tokens are not an error.
    async fn destroy(&self, token: &str) -> Result<(), SessionError>;

    /// Atomically takes the pending-flow marker from the stored record.
    ///
    /// Read-and-clear happens in one store operation, so two requests
    /// sharing a token observe the marker at most once between them.
    async fn take_flow(&self, token: &str) -> Result<Option<PendingFlow>, SessionError>;
}

/// Generates an opaque session token.
#[must_use]
pub fn generate_token() -> String {
    ulid::Ulid::new().to_string()
}

struct Entry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// In-process session store with TTL-based expiry.
///
/// A periodic sweeper removes expired entries; it is started explicitly and
/// stopped at most once.
pub struct MemoryStore {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    sweeper_stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl MemoryStore {
    /// Creates a store whose sessions live for `ttl` after each commit.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
            sweeper_stop: Mutex::new(None),
        }
    }

    /// Starts the background expiry sweeper.
    pub async fn start_sweeper(&self, every: std::time::Duration) {
        let (tx, mut rx) = oneshot::channel();
        *self.sweeper_stop.lock().await = Some(tx);

        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let mut map = entries.write().await;
                        let before = map.len();
                        map.retain(|_, entry| entry.expires_at > now);
                        let removed = before - map.len();
                        if removed > 0 {
                            tracing::debug!(removed, "removed expired sessions");
                        }
                    }
                    _ = &mut rx => {
                        tracing::info!("session sweeper stopped");
                        return;
                    }
                }
            }
        });
    }

    /// Stops the sweeper. Safe to call more than once.
    pub async fn stop_sweeper(&self) {
        if let Some(tx) = self.sweeper_stop.lock().await.take() {
            // The task may already have exited; a failed send is fine.
            let _ = tx.send(());
        }
    }

    /// Removes expired entries immediately, returning how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut map = self.entries.write().await;
        let before = map.len();
        map.retain(|_, entry| entry.expires_at > now);
        before - map.len()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, token: &str) -> Result<Option<SessionData>, SessionError> {
        let map = self.entries.read().await;
        match map.get(token) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.data.clone())),
            _ => Ok(None),
        }
    }

    async fn commit(
        &self,
        token: &str,
        data: &SessionData,
    ) -> Result<DateTime<Utc>, SessionError> {
        let expires_at = Utc::now() + self.ttl;
        let mut map = self.entries.write().await;
        map.insert(
            token.to_string(),
            Entry {
                data: data.clone(),
                expires_at,
            },
        );
        Ok(expires_at)
    }

    async fn destroy(&self, token: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(token);
        Ok(())
    }

    async fn take_flow(&self, token: &str) -> Result<Option<PendingFlow>, SessionError> {
        let mut map = self.entries.write().await;
        match map.get_mut(token) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(entry.data.take_flow()),
            _ => Ok(None),
        }
    }
}

/// Request-scoped view of one session.
///
/// Handlers mutate the working copy and make it durable with [`commit`].
/// Renewing mints a fresh token and drops the old record, the defense
/// against session fixation across the provider round-trip.
///
/// [`commit`]: SessionHandle::commit
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
    token: Option<String>,
    data: SessionData,
}

impl SessionHandle {
    /// Attaches to the session for `token`, or starts an anonymous one.
    ///
    /// Unknown and expired tokens fall back to a fresh anonymous session;
    /// the stale token is discarded so the next commit mints a new one.
    pub async fn attach(store: Arc<dyn SessionStore>, token: Option<&str>) -> Self {
        let (token, data) = match token {
            Some(t) => match store.load(t).await {
                Ok(Some(data)) => (Some(t.to_string()), data),
                Ok(None) => (None, SessionData::default()),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load session, starting fresh");
                    (None, SessionData::default())
                }
            },
            None => (None, SessionData::default()),
        };
        Self { store, token, data }
    }

    /// Returns the current session token, if one has been issued.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the session record.
    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Returns the session record mutably.
    pub fn data_mut(&mut self) -> &mut SessionData {
        &mut self.data
    }

    /// Takes the pending-flow marker exactly once.
    ///
    /// For a durable session the marker is popped through the store, so
    /// concurrent requests sharing a token cannot both observe it; the
    /// working copy is cleared either way. An anonymous session only has
    /// the working copy.
    pub async fn take_flow(&mut self) -> Result<Option<PendingFlow>, SessionError> {
        let local = self.data.take_flow();
        match &self.token {
            Some(token) => self.store.take_flow(token).await,
            None => Ok(local),
        }
    }

    /// Replaces the session token with a freshly generated one.
    ///
    /// The old record is removed from the store; the renewed session only
    /// becomes durable on the next commit.
    pub async fn renew(&mut self) -> Result<(), SessionError> {
        if let Some(old) = self.token.take() {
            self.store.destroy(&old).await?;
        }
        self.token = Some(generate_token());
        Ok(())
    }

    /// Destroys the session: store record removed, working copy reset.
    pub async fn destroy(&mut self) -> Result<(), SessionError> {
        if let Some(token) = self.token.take() {
            self.store.destroy(&token).await?;
        }
        self.data = SessionData::default();
        Ok(())
    }

    /// Persists the session, returning the durable token and its expiry.
    pub async fn commit(&mut self) -> Result<(String, DateTime<Utc>), SessionError> {
        let token = match &self.token {
            Some(t) => t.clone(),
            None => {
                let t = generate_token();
                self.token = Some(t.clone());
                t
            }
        };
        let expires = self.store.commit(&token, &self.data).await?;
        Ok((token, expires))
    }
}
