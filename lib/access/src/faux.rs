//! An in-process handshake for tests and local development.
//!
//! `FauxHandshake` performs no network exchange: identities are queued up
//! front, completion pops the queue, and failure modes are switchable. It
//! still exercises the real state contract — authorization stashes a CSRF
//! state value in the session and completion consumes it.

use crate::error::{ActivationError, HandshakeError};
use crate::handshake::{CallbackParams, Handshake, ProviderIdentity, ProviderRegistration};
use crate::session::SessionData;
use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Session key holding the pending CSRF state.
const STATE_KEY: &str = "faux_state";

/// Session key holding the slug of the pending attempt.
const PROVIDER_KEY: &str = "faux_provider";

/// Handshake double with queued identities.
#[derive(Default)]
pub struct FauxHandshake {
    registered: Mutex<BTreeSet<String>>,
    queue: Mutex<VecDeque<ProviderIdentity>>,
    revoked: Mutex<Vec<String>>,
    fail_complete: AtomicBool,
    fail_revoke: AtomicBool,
}

impl FauxHandshake {
    /// Creates an empty faux handshake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an identity to be returned by the next completion.
    pub async fn queue(&self, identity: ProviderIdentity) {
        self.queue.lock().await.push_back(identity);
    }

    /// Makes every completion fail until reset.
    pub fn fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    /// Makes every revocation fail until reset.
    pub fn fail_revoke(&self, fail: bool) {
        self.fail_revoke.store(fail, Ordering::SeqCst);
    }

    /// Returns the slugs revoke was called for.
    pub async fn revocations(&self) -> Vec<String> {
        self.revoked.lock().await.clone()
    }
}

#[async_trait]
impl Handshake for FauxHandshake {
    async fn activate(&self, registration: ProviderRegistration) -> Result<(), ActivationError> {
        self.registered
            .lock()
            .await
            .insert(registration.provider.slug().to_string());
        Ok(())
    }

    async fn authorization_url(
        &self,
        slug: &str,
        session: &mut SessionData,
    ) -> Result<String, HandshakeError> {
        if !self.registered.lock().await.contains(slug) {
            return Err(HandshakeError::NotRegistered {
                slug: slug.to_string(),
            });
        }

        let state = ulid::Ulid::new().to_string();
        session.set_handshake_value(STATE_KEY, state.clone());
        session.set_handshake_value(PROVIDER_KEY, slug);

        Ok(format!(
            "https://idp.example.invalid/authorize?client_id=faux&provider={slug}&state={state}"
        ))
    }

    async fn complete(
        &self,
        slug: &str,
        params: &CallbackParams,
        session: &mut SessionData,
    ) -> Result<ProviderIdentity, HandshakeError> {
        if !self.registered.lock().await.contains(slug) {
            return Err(HandshakeError::NotRegistered {
                slug: slug.to_string(),
            });
        }

        if !params.has_code() {
            return Err(HandshakeError::NoPendingAttempt);
        }

        let Some(expected) = session.take_handshake_value(STATE_KEY) else {
            return Err(HandshakeError::NoPendingAttempt);
        };
        session.take_handshake_value(PROVIDER_KEY);

        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(HandshakeError::Exchange {
                slug: slug.to_string(),
                reason: "provider rejected the exchange".to_string(),
            });
        }

        if let Some(state) = &params.state {
            if state != &expected {
                return Err(HandshakeError::Exchange {
                    slug: slug.to_string(),
                    reason: "state mismatch".to_string(),
                });
            }
        }

        self.queue
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| HandshakeError::Exchange {
                slug: slug.to_string(),
                reason: "no queued identity".to_string(),
            })
    }

    async fn revoke(&self, slug: &str, _session: &SessionData) -> Result<(), HandshakeError> {
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(HandshakeError::Exchange {
                slug: slug.to_string(),
                reason: "revocation endpoint unavailable".to_string(),
            });
        }
        self.revoked.lock().await.push(slug.to_string());
        Ok(())
    }
}
