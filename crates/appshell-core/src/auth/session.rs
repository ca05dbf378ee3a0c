use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::{AuthError, AuthState, AuthStore};
use crate::models::{AuthData, Token, User};
use crate::routing::{Navigator, LOGIN_PATH};

/// Session actions exposed to the UI: login, logout and profile updates
/// on top of the shared store.
#[derive(Clone)]
pub struct AuthSession {
    store: Arc<AuthStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthSession {
    pub fn new(store: Arc<AuthStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    pub fn login(&self, user: User, token: Token, expires_in_secs: Option<u64>) -> Result<(), AuthError> {
        self.store.set_auth_data(user, token, expires_in_secs)
    }

    /// Clear the session and force a full reset to the login page.
    pub fn logout(&self) {
        info!("Logging out");
        self.store.clear_auth();
        self.navigator.reset_session(LOGIN_PATH);
    }

    pub fn update_user(&self, user: User) -> Result<bool, AuthError> {
        self.store.update_user(user)
    }

    pub fn user(&self) -> Option<User> {
        self.store.get_user()
    }

    pub fn token(&self) -> Option<Token> {
        self.store.get_token()
    }

    pub fn auth_data(&self) -> Option<AuthData> {
        self.store.get_auth_data()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;
    use crate::routing::HistoryNavigator;

    fn session() -> (AuthSession, Arc<HistoryNavigator>) {
        let store = Arc::new(AuthStore::new(MemoryStorage::new()));
        let navigator = Arc::new(HistoryNavigator::new("/dashboard"));
        (AuthSession::new(store, navigator.clone()), navigator)
    }

    #[test]
    fn test_login_then_logout_resets_to_login() {
        let (session, navigator) = session();
        session
            .login(User::new(1, "Ana", "a@x"), Token::bearer("t"), Some(60))
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().token, "t");

        session.logout();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(navigator.take_pending_reset().as_deref(), Some("/login"));
    }

    #[test]
    fn test_update_user_keeps_token() {
        let (session, _) = session();
        session
            .login(User::new(1, "Ana", "a@x"), Token::bearer("t"), None)
            .unwrap();
        assert!(session.update_user(User::new(1, "Ana B", "a@x")).unwrap());
        assert_eq!(session.user().unwrap().name, "Ana B");
        assert_eq!(session.auth_data().unwrap().token.token, "t");
    }

    #[test]
    fn test_subscription_tracks_login() {
        let (session, _) = session();
        let mut rx = session.subscribe();
        session
            .login(User::new(1, "Ana", "a@x"), Token::bearer("t"), None)
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
    }
}
