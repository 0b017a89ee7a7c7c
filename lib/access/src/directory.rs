//! The user directory seam.
//!
//! The gateway never persists users itself; it resolves provider subjects,
//! bearer tokens, and session tokens through this trait and asks it to
//! create or refresh records. `MemoryDirectory` is the in-process
//! implementation used by tests and local development.

use crate::error::DirectoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// A local user as the directory exposes it to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Local user id.
    pub id: String,
    /// Email address from the most recent provider assertion.
    pub email: String,
    /// Display name from the most recent provider assertion.
    pub name: String,
    /// Whether the account is disabled.
    pub disabled: bool,
}

/// Resolves identities against the local user store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the user only if `token` is one of their active sessions.
    ///
    /// This is the defense against a cookie outliving a server-side session
    /// invalidation: a stale token fails here and the caller stays 401.
    async fn user_with_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<UserRecord, DirectoryError>;

    /// Resolves a provider-subject id to a local user id.
    async fn user_id_for_subject(&self, subject: &str) -> Result<String, DirectoryError>;

    /// Resolves an API bearer token to a local user id.
    async fn user_id_for_token(&self, api_token: &str) -> Result<String, DirectoryError>;

    /// Creates a user for the subject, or refreshes an existing one.
    ///
    /// Returns the local user id either way.
    async fn create_or_update(
        &self,
        subject: &str,
        provider: &str,
        email: &str,
        name: &str,
    ) -> Result<String, DirectoryError>;

    /// Updates email and display name for an existing user.
    async fn update_info(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
    ) -> Result<(), DirectoryError>;

    /// Returns whether the user is disabled.
    async fn is_disabled(&self, user_id: &str) -> Result<bool, DirectoryError>;

    /// Records `token` as an active session of the user owning `subject`.
    async fn bind_session(&self, subject: &str, token: &str) -> Result<(), DirectoryError>;

    /// Records a provider-subject connection awaiting attachment.
    async fn create_connection(
        &self,
        subject: &str,
        provider: &str,
    ) -> Result<(), DirectoryError>;

    /// Attaches a previously created connection to a user.
    async fn attach_connection(
        &self,
        user_id: &str,
        subject: &str,
    ) -> Result<(), DirectoryError>;
}

#[derive(Debug, Clone)]
struct Connection {
    subject: String,
    provider: String,
}

#[derive(Debug)]
struct UserEntry {
    record: UserRecord,
    connections: Vec<Connection>,
    sessions: Vec<String>,
    tokens: Vec<String>,
}

#[derive(Default)]
struct Inner {
    users: Vec<UserEntry>,
    pending_connections: HashMap<String, String>,
}

/// In-process directory backed by a vector of users.
#[derive(Default)]
pub struct MemoryDirectory {
    inner: Mutex<Inner>,
    fail: AtomicBool,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation fails with a backend error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DirectoryError::Backend {
                reason: "directory unavailable".to_string(),
            });
        }
        Ok(())
    }

    /// Marks a user disabled or enabled.
    pub async fn set_disabled(&self, user_id: &str, disabled: bool) -> Result<(), DirectoryError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .users
            .iter_mut()
            .find(|u| u.record.id == user_id)
            .ok_or(DirectoryError::NotFound)?;
        entry.record.disabled = disabled;
        Ok(())
    }

    /// Issues a fresh API bearer token for the user.
    pub async fn issue_token(&self, user_id: &str) -> Result<String, DirectoryError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .users
            .iter_mut()
            .find(|u| u.record.id == user_id)
            .ok_or(DirectoryError::NotFound)?;
        let token = ulid::Ulid::new().to_string();
        entry.tokens.push(token.clone());
        Ok(token)
    }

    /// Returns the `(provider, subject)` connections of a user, for
    /// assertions in tests.
    pub async fn connections(&self, user_id: &str) -> Vec<(String, String)> {
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.record.id == user_id)
            .map(|u| {
                u.connections
                    .iter()
                    .map(|c| (c.provider.clone(), c.subject.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn user_with_session(
        &self,
        user_id: &str,
        token: &str,
    ) -> Result<UserRecord, DirectoryError> {
        self.check()?;
        let inner = self.inner.lock().await;
        let entry = inner
            .users
            .iter()
            .find(|u| u.record.id == user_id)
            .ok_or(DirectoryError::NotFound)?;
        if !entry.sessions.iter().any(|s| s == token) {
            return Err(DirectoryError::NotFound);
        }
        Ok(entry.record.clone())
    }

    async fn user_id_for_subject(&self, subject: &str) -> Result<String, DirectoryError> {
        self.check()?;
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.connections.iter().any(|c| c.subject == subject))
            .map(|u| u.record.id.clone())
            .ok_or(DirectoryError::NotFound)
    }

    async fn user_id_for_token(&self, api_token: &str) -> Result<String, DirectoryError> {
        self.check()?;
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.tokens.iter().any(|t| t == api_token))
            .map(|u| u.record.id.clone())
            .ok_or(DirectoryError::NotFound)
    }

    async fn create_or_update(
        &self,
        subject: &str,
        provider: &str,
        email: &str,
        name: &str,
    ) -> Result<String, DirectoryError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner
            .users
            .iter_mut()
            .find(|u| u.connections.iter().any(|c| c.subject == subject))
        {
            entry.record.email = email.to_string();
            entry.record.name = name.to_string();
            return Ok(entry.record.id.clone());
        }

        let id = ulid::Ulid::new().to_string();
        inner.users.push(UserEntry {
            record: UserRecord {
                id: id.clone(),
                email: email.to_string(),
                name: name.to_string(),
                disabled: false,
            },
            connections: vec![Connection {
                subject: subject.to_string(),
                provider: provider.to_string(),
            }],
            sessions: Vec::new(),
            tokens: Vec::new(),
        });
        Ok(id)
    }

    async fn update_info(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
    ) -> Result<(), DirectoryError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let entry = inner
            .users
            .iter_mut()
            .find(|u| u.record.id == user_id)
            .ok_or(DirectoryError::NotFound)?;
        entry.record.email = email.to_string();
        entry.record.name = name.to_string();
        Ok(())
    }

    async fn is_disabled(&self, user_id: &str) -> Result<bool, DirectoryError> {
        self.check()?;
        let inner = self.inner.lock().await;
        inner
            .users
            .iter()
            .find(|u| u.record.id == user_id)
            .map(|u| u.record.disabled)
            .ok_or(DirectoryError::NotFound)
    }

    async fn bind_session(&self, subject: &str, token: &str) -> Result<(), DirectoryError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let entry = inner
            .users
            .iter_mut()
            .find(|u| u.connections.iter().any(|c| c.subject == subject))
            .ok_or(DirectoryError::NotFound)?;
        entry.sessions.push(token.to_string());
        Ok(())
    }

    async fn create_connection(
        &self,
        subject: &str,
        provider: &str,
    ) -> Result<(), DirectoryError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        inner
            .pending_connections
            .insert(subject.to_string(), provider.to_string());
        Ok(())
    }

    async fn attach_connection(
        &self,
        user_id: &str,
        subject: &str,
    ) -> Result<(), DirectoryError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let provider = inner
            .pending_connections
            .remove(subject)
            .ok_or(DirectoryError::NotFound)?;
        let entry = match inner.users.iter_mut().find(|u| u.record.id == user_id) {
            Some(entry) => entry,
            None => {
                // Restore the pending connection so a retry can succeed.
                inner
                    .pending_connections
                    .insert(subject.to_string(), provider);
                return Err(DirectoryError::NotFound);
            }
        };
        entry.connections.push(Connection {
            subject: subject.to_string(),
            provider,
        });
        Ok(())
    }
}
