use tracing::debug;

use crate::auth::AuthStore;

/// Paths reachable without a session.
pub const DEFAULT_PUBLIC_ROUTES: &[&str] = &["/login", "/register", "/forgot-password"];

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Outcome of a guarded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(String),
}

/// Decides whether a route transition may proceed given the session state.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    public_routes: Vec<String>,
    login_path: String,
    home_path: String,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect())
    }
}

impl NavigationGuard {
    pub fn new(public_routes: Vec<String>) -> Self {
        Self {
            public_routes,
            login_path: LOGIN_PATH.to_string(),
            home_path: HOME_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_home_path(mut self, path: impl Into<String>) -> Self {
        self.home_path = path.into();
        self
    }

    pub fn public_routes(&self) -> &[String] {
        &self.public_routes
    }

    /// Exact match or a sub-path of a public route.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_routes.iter().any(|route| {
            path == route
                || path
                    .strip_prefix(route.as_str())
                    .map(|rest| rest.starts_with('/'))
                    .unwrap_or(false)
        })
    }

    /// Run the guard against the store's current state.
    pub fn check(&self, store: &AuthStore, path: &str) -> GuardDecision {
        self.decide(path, store.is_authenticated())
    }

    pub fn decide(&self, path: &str, authenticated: bool) -> GuardDecision {
        let decision = if authenticated {
            // Signed-in users are bounced off the exact login/register pages only
            if self.public_routes.iter().any(|route| route == path) {
                GuardDecision::Redirect(self.home_path.clone())
            } else {
                GuardDecision::Allow
            }
        } else if self.is_public(path) {
            GuardDecision::Allow
        } else {
            // Root included: it is not public, only exempt for signed-in users
            GuardDecision::Redirect(self.login_path.clone())
        };
        debug!(path = path, authenticated = authenticated, decision = ?decision, "Route guard");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;
    use crate::models::{Token, User};

    fn redirect(path: &str) -> GuardDecision {
        GuardDecision::Redirect(path.to_string())
    }

    #[test]
    fn test_decision_table() {
        let guard = NavigationGuard::default();

        assert_eq!(guard.decide("/login", true), redirect("/"));
        assert_eq!(guard.decide("/dashboard", true), GuardDecision::Allow);
        assert_eq!(guard.decide("/register", false), GuardDecision::Allow);
        assert_eq!(guard.decide("/", false), redirect("/login"));
        assert_eq!(guard.decide("/dashboard", false), redirect("/login"));
        assert_eq!(guard.decide("/", true), GuardDecision::Allow);
    }

    #[test]
    fn test_public_sub_paths() {
        let guard = NavigationGuard::default();
        assert!(guard.is_public("/forgot-password/sent"));
        assert!(!guard.is_public("/loginx"));
        assert!(!guard.is_public("/"));

        assert_eq!(guard.decide("/forgot-password/sent", false), GuardDecision::Allow);
        assert_eq!(guard.decide("/loginx", false), redirect("/login"));
        // Only exact public paths bounce a signed-in user
        assert_eq!(guard.decide("/login/help", true), GuardDecision::Allow);
    }

    #[test]
    fn test_custom_paths() {
        let guard = NavigationGuard::new(vec!["/app/auth/login".to_string()])
            .with_login_path("/app/auth/login")
            .with_home_path("/app/home");

        assert_eq!(guard.decide("/app/auth/login", true), redirect("/app/home"));
        assert_eq!(guard.decide("/app/reports", false), redirect("/app/auth/login"));
    }

    #[test]
    fn test_check_reads_store() {
        let guard = NavigationGuard::default();
        let store = AuthStore::new(MemoryStorage::new());
        assert_eq!(guard.check(&store, "/dashboard"), redirect("/login"));

        store
            .set_auth_data(User::new(1, "Ana", "a@x"), Token::bearer("t"), None)
            .unwrap();
        assert_eq!(guard.check(&store, "/dashboard"), GuardDecision::Allow);
        assert_eq!(guard.check(&store, "/login"), redirect("/"));
    }
}
