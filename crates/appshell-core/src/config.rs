//! Application configuration management.
//!
//! Two layers:
//! - `Config`: persisted settings (API URL override, pages directory,
//!   landing path, public routes) stored at `~/.config/appshell/config.json`
//! - `ClientConfig`: what one HTTP client instance is built from, defaulting
//!   to the `APPSHELL_API_URL` environment variable

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::routing::table::DEFAULT_LANDING_PATH;
use crate::routing::DEFAULT_PUBLIC_ROUTES;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "appshell";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "APPSHELL_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3333";

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub pages_dir: Option<PathBuf>,
    pub landing_path: Option<String>,
    pub public_routes: Option<Vec<String>>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Read a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding session storage and logs.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn landing_path(&self) -> &str {
        self.landing_path.as_deref().unwrap_or(DEFAULT_LANDING_PATH)
    }

    pub fn public_routes(&self) -> Vec<String> {
        match self.public_routes {
            Some(ref routes) => routes.clone(),
            None => DEFAULT_PUBLIC_ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Client settings: the file's `api_url` wins over the environment.
    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig::from_env();
        if let Some(ref url) = self.api_url {
            client.base_url = url.clone();
        }
        client
    }
}

/// Settings for one HTTP client instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            headers,
        }
    }

    /// Base URL from `APPSHELL_API_URL`, falling back to the local dev server.
    pub fn from_env() -> Self {
        Self::new(Self::base_url_from(std::env::var(API_URL_ENV).ok()))
    }

    fn base_url_from(value: Option<String>) -> String {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_fallback() {
        assert_eq!(ClientConfig::base_url_from(None), DEFAULT_API_URL);
        assert_eq!(ClientConfig::base_url_from(Some("  ".to_string())), DEFAULT_API_URL);
        assert_eq!(
            ClientConfig::base_url_from(Some("https://api.example.com".to_string())),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(
            config.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_config_overrides_api_url() {
        let config = Config {
            api_url: Some("https://staging.example.com".to_string()),
            ..Config::default()
        };
        assert_eq!(config.client_config().base_url, "https://staging.example.com");
    }

    #[test]
    fn test_config_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.landing_path(), "/app/auth/login");
        assert_eq!(config.public_routes(), vec!["/login", "/register", "/forgot-password"]);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_from(&tmp.path().join("config.json")).unwrap();
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_load_from_reads_file_and_names_it_on_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"api_url": "https://api.example.com"}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://api.example.com"));

        std::fs::write(&path, "{oops").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
