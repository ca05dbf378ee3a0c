use std::sync::{Mutex, MutexGuard};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::storage::SessionStorage;
use super::AuthError;
use crate::models::{AuthData, Token, User};

/// Storage key for the composite auth record
const AUTH_DATA_KEY: &str = "auth_data";

/// Standalone copy of the user for fast reads
const USER_KEY: &str = "auth_user";

/// Standalone copy of the token for fast reads
const TOKEN_KEY: &str = "auth_token";

/// Snapshot of the authentication state published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<Token>,
    pub auth_data: Option<AuthData>,
    pub is_authenticated: bool,
}

impl AuthState {
    fn from_data(data: &AuthData) -> Self {
        Self {
            user: Some(data.user.clone()),
            token: Some(data.token.clone()),
            auth_data: Some(data.clone()),
            is_authenticated: true,
        }
    }
}

/// Owner of the canonical user/token pair for one session.
///
/// Every mutation writes through to storage and publishes a new
/// [`AuthState`] while still holding the storage lock, so the published
/// state always matches what storage holds. Expiry is only checked when something
/// reads; an expired record stays in storage until then.
pub struct AuthStore {
    storage: Mutex<Box<dyn SessionStorage>>,
    state: watch::Sender<AuthState>,
}

impl AuthStore {
    /// Create a store over `storage`, hydrating state from whatever it holds.
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        let store = Self {
            storage: Mutex::new(Box::new(storage)),
            state,
        };
        store.refresh();
        store
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Last published state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Persist a new login and publish it.
    pub fn set_auth_data(
        &self,
        user: User,
        token: Token,
        expires_in_secs: Option<u64>,
    ) -> Result<(), AuthError> {
        let data = AuthData::new(user, token, expires_in_secs);
        let mut storage = self.lock();
        Self::write_all(&mut **storage, &data)?;
        self.state.send_replace(AuthState::from_data(&data));
        info!(user = %data.user.id, expires_at = ?data.expires_at, "Auth data stored");
        Ok(())
    }

    pub fn get_user(&self) -> Option<User> {
        let mut storage = self.lock();
        if Self::evict_if_expired(&mut **storage) {
            self.publish_cleared();
            return None;
        }
        Self::read(&**storage, USER_KEY)
    }

    pub fn get_token(&self) -> Option<Token> {
        let mut storage = self.lock();
        if Self::evict_if_expired(&mut **storage) {
            self.publish_cleared();
            return None;
        }
        Self::read(&**storage, TOKEN_KEY)
    }

    /// The composite record, or `None` if missing, unparsable or expired.
    /// An expired record is removed as a side effect.
    pub fn get_auth_data(&self) -> Option<AuthData> {
        let mut storage = self.lock();
        let data: AuthData = Self::read(&**storage, AUTH_DATA_KEY)?;
        if data.is_expired() {
            info!(expires_at = ?data.expires_at, "Auth data expired, clearing session");
            Self::remove_all(&mut **storage);
            self.publish_cleared();
            return None;
        }
        Some(data)
    }

    /// True only when the token, the user and a live composite record all resolve.
    pub fn is_authenticated(&self) -> bool {
        let token = self.get_token();
        let user = self.get_user();
        let auth_data = self.get_auth_data();
        token.is_some() && user.is_some() && auth_data.is_some()
    }

    /// Replace the user, keeping token and expiry. Returns `false` when
    /// there is no session to update.
    pub fn update_user(&self, user: User) -> Result<bool, AuthError> {
        let Some(mut data) = self.get_auth_data() else {
            debug!("update_user called without a session, ignoring");
            return Ok(false);
        };
        data.user = user;
        self.replace(data)?;
        Ok(true)
    }

    /// Replace token and expiry, keeping the user. Returns `false` when
    /// there is no session to renew.
    pub fn renew_token(&self, token: Token, expires_in_secs: Option<u64>) -> Result<bool, AuthError> {
        let Some(current) = self.get_auth_data() else {
            debug!("renew_token called without a session, ignoring");
            return Ok(false);
        };
        let data = AuthData::new(current.user, token, expires_in_secs);
        self.replace(data)?;
        Ok(true)
    }

    /// Remove all persisted auth fields and publish an empty state.
    pub fn clear_auth(&self) {
        let mut storage = self.lock();
        Self::remove_all(&mut **storage);
        self.publish_cleared();
    }

    /// Re-read storage and publish what it holds.
    pub fn refresh(&self) {
        let mut storage = self.lock();
        if Self::evict_if_expired(&mut **storage) {
            self.state.send_replace(AuthState::default());
            return;
        }
        let data = Self::read::<AuthData>(&**storage, AUTH_DATA_KEY);
        let user = Self::read::<User>(&**storage, USER_KEY);
        let token = Self::read::<Token>(&**storage, TOKEN_KEY);
        let state = match (data, user, token) {
            (Some(data), Some(_), Some(_)) => AuthState::from_data(&data),
            _ => AuthState::default(),
        };
        self.state.send_replace(state);
    }

    fn replace(&self, data: AuthData) -> Result<(), AuthError> {
        let mut storage = self.lock();
        Self::write_all(&mut **storage, &data)?;
        self.state.send_replace(AuthState::from_data(&data));
        Ok(())
    }

    /// Callers hold the storage lock.
    fn publish_cleared(&self) {
        self.state.send_if_modified(|state| {
            if *state == AuthState::default() {
                false
            } else {
                *state = AuthState::default();
                true
            }
        });
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn SessionStorage>> {
        // A panic mid-write leaves at worst a stale entry, which reads tolerate
        self.storage.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write all three keys, or none of them.
    fn write_all(storage: &mut dyn SessionStorage, data: &AuthData) -> Result<(), AuthError> {
        let result = Self::write_each(storage, data);
        if let Err(ref e) = result {
            error!(error = %e, "Failed to persist auth data, clearing partial write");
            Self::remove_all(storage);
        }
        result
    }

    fn write_each(storage: &mut dyn SessionStorage, data: &AuthData) -> Result<(), AuthError> {
        Self::write(storage, AUTH_DATA_KEY, data)?;
        Self::write(storage, USER_KEY, &data.user)?;
        Self::write(storage, TOKEN_KEY, &data.token)
    }

    fn write<T: Serialize>(
        storage: &mut dyn SessionStorage,
        key: &str,
        value: &T,
    ) -> Result<(), AuthError> {
        let json = serde_json::to_string(value).map_err(|source| AuthError::Serialize {
            key: key.to_string(),
            source,
        })?;
        storage.set_item(key, &json)
    }

    /// Read and parse a key. Missing, unreadable and unparsable all come back as `None`.
    fn read<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
        let raw = match storage.get_item(key) {
            Ok(raw) => raw?,
            Err(e) => {
                error!(key = key, error = %e, "Failed to read session storage");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key = key, error = %e, "Failed to parse session storage entry");
                None
            }
        }
    }

    fn evict_if_expired(storage: &mut dyn SessionStorage) -> bool {
        let expired = Self::read::<AuthData>(storage, AUTH_DATA_KEY)
            .map(|data| data.is_expired())
            .unwrap_or(false);
        if expired {
            info!("Auth data expired, clearing session");
            Self::remove_all(storage);
        }
        expired
    }

    fn remove_all(storage: &mut dyn SessionStorage) {
        for key in [AUTH_DATA_KEY, USER_KEY, TOKEN_KEY] {
            if let Err(e) = storage.remove_item(key) {
                error!(key = key, error = %e, "Failed to remove session storage entry");
            }
        }
    }
}
