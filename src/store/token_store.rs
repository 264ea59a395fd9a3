use crate::domain::{is_token_expired_at, TokenClaims, TokenPair};
use crate::store::{KeyValueStore, MemoryStore};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Holds the current access/refresh token pair on top of a durable store.
///
/// Storage failures are logged and degrade to "no token"; no method here
/// returns an error.
///
/// Every login (`set_pair`) and `clear` starts a new session generation.
/// A refresh only lands in the session it was started from.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
    session: Arc<Mutex<u64>>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(0)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Stores `access`; `refresh` of `None` keeps the stored refresh token.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>) {
        let _session = self.lock_session();
        self.store(access, refresh);
    }

    /// Replaces the pair and starts a new session.
    pub fn set_pair(&self, pair: &TokenPair) {
        let mut session = self.lock_session();
        *session += 1;
        self.store(&pair.access_token, Some(&pair.refresh_token));
    }

    /// Removes both tokens and ends the current session.
    pub fn clear(&self) {
        let mut session = self.lock_session();
        *session += 1;
        self.remove_all();
    }

    pub fn session(&self) -> u64 {
        *self.lock_session()
    }

    /// `set_tokens`, unless a login or `clear` happened since `session`.
    pub fn set_tokens_in_session(
        &self,
        session: u64,
        access: &str,
        refresh: Option<&str>,
    ) -> bool {
        let current = self.lock_session();
        if *current != session {
            debug!("Session {} ended, dropping tokens for it", session);
            return false;
        }
        self.store(access, refresh);
        true
    }

    /// `clear`, unless a login or `clear` happened since `session`.
    pub fn clear_in_session(&self, session: u64) -> bool {
        let mut current = self.lock_session();
        if *current != session {
            return false;
        }
        *current += 1;
        self.remove_all();
        true
    }

    pub fn is_expired(&self, token: &str) -> bool {
        is_token_expired_at(token, Utc::now().timestamp())
    }

    /// The stored access token if it is present and still valid.
    pub fn usable_access_token(&self) -> Option<String> {
        self.access_token().filter(|token| !self.is_expired(token))
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        self.access_token()
            .and_then(|token| TokenClaims::decode(&token).ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.refresh_token().is_some() || self.usable_access_token().is_some()
    }

    fn lock_session(&self) -> MutexGuard<'_, u64> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(&self, access: &str, refresh: Option<&str>) {
        self.write(ACCESS_TOKEN_KEY, access);
        if let Some(refresh) = refresh {
            self.write(REFRESH_TOKEN_KEY, refresh);
        }
        debug!("Stored tokens (refresh rotated: {})", refresh.is_some());
    }

    fn remove_all(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.backend.remove(key) {
                warn!("Failed to remove {}: {}", key, e);
            }
        }
        debug!("Cleared tokens");
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!("Failed to persist {}: {}", key, e);
        }
    }
}
