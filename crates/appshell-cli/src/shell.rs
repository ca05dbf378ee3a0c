use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use appshell_core::routing::{Navigation, Navigator, RouteTable};
use appshell_core::{
    ApiClient, AuthSession, AuthStore, Config, FileStorage, GuardDecision, HistoryNavigator,
    NavigationGuard, RouteTableBuilder, Router, Token, User,
};

/// Environment variable naming the session (the CLI's stand-in for a tab)
const SESSION_ENV: &str = "APPSHELL_SESSION";

const DEFAULT_SESSION: &str = "default";

/// Pages directory used when neither the argument nor the config names one
const DEFAULT_PAGES_DIR: &str = "src/pages";

/// One page load of the shell: a restored session plus the pieces that read it.
pub struct Shell {
    config: Config,
    store: Arc<AuthStore>,
    navigator: Arc<HistoryNavigator>,
    session: AuthSession,
    guard: NavigationGuard,
}

impl Shell {
    pub fn open(config: &Config, cache_dir: &Path) -> Result<Self> {
        let session_id = std::env::var(SESSION_ENV).unwrap_or_else(|_| DEFAULT_SESSION.to_string());
        let storage = FileStorage::for_session(cache_dir, &session_id);
        debug!(session = %session_id, dir = %storage.dir().display(), "Opening session");

        let store = Arc::new(AuthStore::new(storage));
        let navigator = Arc::new(HistoryNavigator::new("/"));
        let session = AuthSession::new(store.clone(), navigator.clone());
        let guard = NavigationGuard::new(config.public_routes());

        Ok(Self {
            config: config.clone(),
            store,
            navigator,
            session,
            guard,
        })
    }

    fn pages_dir(&self, arg: Option<&str>) -> PathBuf {
        arg.map(PathBuf::from)
            .or_else(|| self.config.pages_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_DIR))
    }

    fn route_table(&self, pages_dir: &Path) -> Result<RouteTable> {
        RouteTableBuilder::default()
            .with_landing_path(self.config.landing_path())
            .build_from_dir(pages_dir)
            .with_context(|| format!("Failed to build routes from {}", pages_dir.display()))
    }

    pub fn routes(&self, pages_dir: Option<&str>) -> Result<()> {
        let table = self.route_table(&self.pages_dir(pages_dir))?;
        println!("{}", serde_json::to_string_pretty(&table)?);
        Ok(())
    }

    pub fn guard(&self, path: &str) -> Result<()> {
        match self.guard.check(&self.store, path) {
            GuardDecision::Allow => println!("allow {}", path),
            GuardDecision::Redirect(to) => println!("redirect {} -> {}", path, to),
        }
        Ok(())
    }

    pub fn go(&self, path: &str) -> Result<()> {
        let table = self.route_table(&self.pages_dir(None))?;
        let router = Router::new(
            table,
            self.guard.clone(),
            self.store.clone(),
            self.navigator.clone(),
        );
        match router.push(path)? {
            Navigation::Page {
                path,
                component,
                params,
                redirected_from,
            } => {
                if let Some(from) = redirected_from {
                    println!("redirected from {}", from);
                }
                println!("{} -> {}", path, component);
                for (name, value) in params {
                    println!("  {} = {}", name, value);
                }
            }
            Navigation::NotFound { path } => println!("no route for {}", path),
        }
        Ok(())
    }

    pub fn login(&self, user_json: &str, token: &str, expires_in: Option<u64>) -> Result<()> {
        let user: User = serde_json::from_str(user_json).context("Failed to parse user JSON")?;
        let token = parse_token(token)?;
        self.session.login(user, token, expires_in)?;
        if let Some(user) = self.session.user() {
            println!("Signed in as {}", user.display_name());
        }
        Ok(())
    }

    pub fn renew(&self, token: &str, expires_in: Option<u64>) -> Result<()> {
        if self.store.renew_token(parse_token(token)?, expires_in)? {
            println!("Token renewed");
        } else {
            println!("Not signed in");
        }
        Ok(())
    }

    pub fn whoami(&self) -> Result<()> {
        match self.session.auth_data() {
            Some(data) => {
                println!("{}", serde_json::to_string_pretty(&data.user)?);
                if let Some(secs) = data.seconds_until_expiry() {
                    println!("Session expires in {}s", secs);
                }
            }
            None => println!("Not signed in"),
        }
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.session.logout();
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<()> {
        let api = ApiClient::new(
            self.config.client_config(),
            self.store.clone(),
            self.navigator.clone(),
        )?;
        let body: Value = api.get(path).await?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    }

    /// Report a full session reset scheduled during this command.
    pub fn finish(&self) {
        if let Some(target) = self.navigator.take_pending_reset() {
            eprintln!("Session reset - continue at {}", target);
        }
        debug!(path = %self.navigator.current_path(), "Shell closed");
    }
}

/// A token argument is either a bare bearer string or a JSON token object.
fn parse_token(arg: &str) -> Result<Token> {
    if arg.trim_start().starts_with('{') {
        serde_json::from_str(arg).context("Failed to parse token JSON")
    } else {
        Ok(Token::bearer(arg))
    }
}
