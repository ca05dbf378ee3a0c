//! HTTP client for the application backend.
//!
//! `ApiClient` injects the session token into every request and reacts to
//! 401 responses by clearing the session and scheduling a full session
//! reset to the login page. 403, 404 and 5xx are logged and returned to the
//! caller unchanged; network errors are never swallowed. Nothing here
//! retries.

pub mod client;
pub mod error;
pub mod interceptor;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::AuthInterceptor;
