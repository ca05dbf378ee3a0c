//! Request/response hooks shared by every `ApiClient` instance.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, Response, Url};
use tracing::{debug, error, warn};

use super::ApiError;
use crate::auth::AuthStore;
use crate::routing::{Navigator, LOGIN_PATH};

/// Pages where a 401 must not bounce the user again.
const AUTH_PAGES: &[&str] = &["/login", "/register"];

/// Injects the session token into requests and tears the session down on 401.
#[derive(Clone)]
pub struct AuthInterceptor {
    store: Arc<AuthStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthInterceptor {
    pub fn new(store: Arc<AuthStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Add `Authorization: Bearer <token>` when the session has a token.
    pub fn on_request(&self, request: &mut Request) -> Result<(), ApiError> {
        debug!(method = %request.method(), url = %request.url(), "API request");

        let Some(token) = self.store.get_token().filter(|t| !t.token.is_empty()) else {
            return Ok(());
        };
        let mut value = HeaderValue::from_str(&token.authorization_value()).map_err(|e| {
            error!(error = %e, "Token is not a valid header value");
            ApiError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            }
        })?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Classify the outcome of a request. Successful responses pass through;
    /// everything else is logged and returned as an error.
    pub async fn on_response(
        &self,
        method: &Method,
        url: &Url,
        result: Result<Response, reqwest::Error>,
    ) -> Result<Response, ApiError> {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.is_timeout() {
                    error!(method = %method, url = %url, error = %e, "Request timed out");
                } else if e.is_builder() {
                    error!(method = %method, url = %url, error = %e, "Request configuration error");
                } else {
                    error!(method = %method, url = %url, error = %e, "Network error");
                }
                return Err(ApiError::NetworkError(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(method = %method, url = %url, status = status.as_u16(), "API response");
            return Ok(response);
        }

        match status.as_u16() {
            401 => {
                warn!(method = %method, url = %url, "Token expired or invalid - closing session");
                self.handle_unauthorized();
            }
            403 => warn!(method = %method, url = %url, "Access forbidden"),
            404 => warn!(method = %method, url = %url, "Resource not found"),
            500..=599 => error!(method = %method, url = %url, status = status.as_u16(), "Server error"),
            _ => {}
        }

        let body = error_body(method, url, response.text().await);
        debug!(method = %method, url = %url, status = status.as_u16(), body = %body, "API error");
        Err(ApiError::from_status(status, &body))
    }

    fn handle_unauthorized(&self) {
        self.store.clear_auth();
        let current = self.navigator.current_path();
        if AUTH_PAGES.contains(&current.as_str()) {
            return;
        }
        self.navigator.reset_session(LOGIN_PATH);
    }
}

/// Body of an error response, empty when it cannot be read.
fn error_body(method: &Method, url: &Url, body: Result<String, reqwest::Error>) -> String {
    body.unwrap_or_else(|e| {
        debug!(method = %method, url = %url, error = %e, "Failed to read error response body");
        String::new()
    })
}
