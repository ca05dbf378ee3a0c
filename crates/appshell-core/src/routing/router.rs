use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{GuardDecision, NavigationGuard, Navigator, RouteError, RouteTable, RouteTarget};
use crate::auth::AuthStore;

/// Redirect hops followed before giving up on a transition.
const MAX_REDIRECTS: usize = 10;

/// Where a transition ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// A page was reached, possibly after redirects.
    Page {
        path: String,
        component: String,
        params: BTreeMap<String, String>,
        redirected_from: Option<String>,
    },
    /// No route matches the final path.
    NotFound { path: String },
}

/// Guarded navigation over a route table.
pub struct Router {
    table: RouteTable,
    guard: NavigationGuard,
    store: Arc<AuthStore>,
    navigator: Arc<dyn Navigator>,
}

impl Router {
    pub fn new(
        table: RouteTable,
        guard: NavigationGuard,
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            table,
            guard,
            store,
            navigator,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    /// Navigate to `path`, applying the guard and table redirects.
    pub fn push(&self, path: &str) -> Result<Navigation, RouteError> {
        let mut current = path.to_string();

        for _ in 0..MAX_REDIRECTS {
            if let GuardDecision::Redirect(to) = self.guard.check(&self.store, &current) {
                current = to;
                continue;
            }

            let Some(found) = self.table.resolve(&current) else {
                warn!(path = %current, "No route matches");
                return Ok(Navigation::NotFound { path: current });
            };

            match &found.entry.target {
                RouteTarget::Redirect(to) => {
                    debug!(from = %current, to = %to, "Route redirect");
                    current = to.clone();
                }
                RouteTarget::Component(component) => {
                    self.navigator.navigate(&current);
                    let redirected_from = (current != path).then(|| path.to_string());
                    return Ok(Navigation::Page {
                        component: component.clone(),
                        params: found.params,
                        path: current,
                        redirected_from,
                    });
                }
            }
        }

        Err(RouteError::RedirectLoop(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStorage;
    use crate::models::{Token, User};
    use crate::routing::{HistoryNavigator, RouteTableBuilder};

    fn setup() -> (Router, Arc<AuthStore>, Arc<HistoryNavigator>) {
        let table = RouteTableBuilder::default().build(vec![
            "/src/pages/login.vue",
            "/src/pages/dashboard.vue",
            "/src/pages/app/auth/login.vue",
            "/src/pages/users/[id]/index.vue",
        ]);
        let store = Arc::new(AuthStore::new(MemoryStorage::new()));
        let navigator = Arc::new(HistoryNavigator::new("/"));
        let router = Router::new(
            table,
            NavigationGuard::default(),
            store.clone(),
            navigator.clone(),
        );
        (router, store, navigator)
    }

    fn login(store: &AuthStore) {
        store
            .set_auth_data(User::new(1, "Ana", "a@x"), Token::bearer("t"), None)
            .unwrap();
    }

    #[test]
    fn test_anonymous_user_lands_on_login() {
        let (router, _, navigator) = setup();
        let nav = router.push("/dashboard").unwrap();
        match nav {
            Navigation::Page { path, redirected_from, .. } => {
                assert_eq!(path, "/login");
                assert_eq!(redirected_from.as_deref(), Some("/dashboard"));
            }
            other => panic!("unexpected navigation: {:?}", other),
        }
        assert_eq!(navigator.current_path(), "/login");
    }

    #[test]
    fn test_authenticated_root_follows_table_redirect() {
        let (router, store, _) = setup();
        login(&store);
        let nav = router.push("/").unwrap();
        match nav {
            Navigation::Page { path, component, .. } => {
                assert_eq!(path, "/app/auth/login");
                assert_eq!(component, "/src/pages/app/auth/login.vue");
            }
            other => panic!("unexpected navigation: {:?}", other),
        }
    }

    #[test]
    fn test_params_are_bound() {
        let (router, store, _) = setup();
        login(&store);
        let Navigation::Page { params, redirected_from, .. } = router.push("/users/7").unwrap() else {
            panic!("expected a page");
        };
        assert_eq!(params.get("id").map(String::as_str), Some("7"));
        assert!(redirected_from.is_none());
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let (router, store, _) = setup();
        login(&store);
        assert_eq!(
            router.push("/missing").unwrap(),
            Navigation::NotFound { path: "/missing".to_string() }
        );
    }

    #[test]
    fn test_redirect_loop_is_reported() {
        let table = RouteTableBuilder::default()
            .with_landing_path("/")
            .build(Vec::<String>::new());
        let store = Arc::new(AuthStore::new(MemoryStorage::new()));
        login(&store);
        let router = Router::new(
            table,
            NavigationGuard::default(),
            store,
            Arc::new(HistoryNavigator::default()),
        );
        assert!(matches!(router.push("/"), Err(RouteError::RedirectLoop(_))));
    }
}
