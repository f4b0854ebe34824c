use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Prefix that marks a value as a nonce rather than a state token.
pub const NONCE_PREFIX: char = 'N';

/// Generate a cryptographically random state parameter.
/// 32 random bytes, base64url-encoded without padding.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a cryptographically random nonce: `N` followed by 24 random
/// bytes, base64url-encoded without padding.
pub fn generate_nonce() -> String {
    let bytes: [u8; 24] = rand::rng().random();
    format!("{NONCE_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

/// A pending authorization attempt, persisted when the resource owner is
/// sent to the authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationAttempt {
    pub state: String,
    pub nonce: String,
    /// Session that started the attempt.
    pub session: String,
    pub created_at: SystemTime,
}

impl AuthorizationAttempt {
    /// Mint a fresh attempt for `session` with its own state and the given nonce.
    pub fn new(session: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            state: generate_state(),
            nonce: nonce.into(),
            session: session.into(),
            created_at: SystemTime::now(),
        }
    }

    /// Whether the attempt is older than `lifetime` at `now`.
    pub fn is_expired_at(&self, lifetime: Duration, now: SystemTime) -> bool {
        now.duration_since(self.created_at)
            .map(|age| age > lifetime)
            .unwrap_or(false)
    }
}

/// Durable storage for pending authorization attempts, keyed by state.
///
/// Implementations must tolerate concurrent inserts and lookups from
/// independent requests. A relational table with a unique key on `state`
/// satisfies this without extra locking.
pub trait StateStore: Send + Sync {
    fn insert(
        &self,
        attempt: AuthorizationAttempt,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send;

    fn find(
        &self,
        state: &str,
    ) -> impl Future<
        Output = Result<Option<AuthorizationAttempt>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;

    /// Remove and return the attempt for `state`. A second call for the same
    /// state must return `None`.
    fn take(
        &self,
        state: &str,
    ) -> impl Future<
        Output = Result<Option<AuthorizationAttempt>, Box<dyn std::error::Error + Send + Sync>>,
    > + Send;

    /// Delete attempts created before `created_before`, returning how many
    /// were removed.
    fn prune(
        &self,
        created_before: SystemTime,
    ) -> impl Future<Output = Result<usize, Box<dyn std::error::Error + Send + Sync>>> + Send;
}

/// In-memory [`StateStore`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    attempts: Mutex<HashMap<String, AuthorizationAttempt>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, AuthorizationAttempt>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.attempts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StateStore for InMemoryStateStore {
    async fn insert(
        &self,
        attempt: AuthorizationAttempt,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut attempts = self.lock();
        if attempts.contains_key(&attempt.state) {
            return Err("duplicate state token".into());
        }
        attempts.insert(attempt.state.clone(), attempt);
        Ok(())
    }

    async fn find(
        &self,
        state: &str,
    ) -> Result<Option<AuthorizationAttempt>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.lock().get(state).cloned())
    }

    async fn take(
        &self,
        state: &str,
    ) -> Result<Option<AuthorizationAttempt>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.lock().remove(state))
    }

    async fn prune(
        &self,
        created_before: SystemTime,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let mut attempts = self.lock();
        let before = attempts.len();
        attempts.retain(|_, attempt| attempt.created_at >= created_before);
        Ok(before - attempts.len())
    }
}
