//! API client for the application backend.
//!
//! `ApiClient` wraps a `reqwest::Client` and runs every request through the
//! shared [`AuthInterceptor`]: the session token goes out as a bearer
//! header, and a 401 coming back ends the session.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

use super::{ApiError, AuthInterceptor};
use crate::auth::AuthStore;
use crate::config::ClientConfig;
use crate::routing::Navigator;

/// API client bound to one base URL.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    interceptor: AuthInterceptor,
}

impl ApiClient {
    /// Create a client for `config` sharing the given session.
    pub fn new(
        config: ClientConfig,
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        Self::with_interceptor(config, AuthInterceptor::new(store, navigator))
    }

    /// Create another client with its own base URL, timeout and headers but
    /// the same session handling as this one.
    pub fn create_instance(&self, config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_interceptor(config, self.interceptor.clone())
    }

    fn with_interceptor(config: ClientConfig, interceptor: AuthInterceptor) -> Result<Self, ApiError> {
        let headers = Self::default_headers(&config)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(ApiError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            interceptor,
        })
    }

    fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let invalid = |reason: String| ApiError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        self.interceptor.store()
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Start a request against this client's base URL.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Run a request through the interceptors and return the raw response.
    /// Non-2xx statuses come back as errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let mut request = builder.build().map_err(|e| {
            error!(error = %e, "Request configuration error");
            ApiError::RequestError(e)
        })?;
        self.interceptor.on_request(&mut request)?;

        let method = request.method().clone();
        let url = request.url().clone();
        let result = self.client.execute(request).await;
        self.interceptor.on_response(&method, &url, result).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let url = response.url().clone();
        response.json().await.map_err(|source| {
            error!(url = %url, error = %source, "Failed to parse JSON response");
            ApiError::Decode {
                url: url.to_string(),
                source,
            }
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::GET, path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(self.request(Method::DELETE, path)).await
    }

    /// POST a multipart form. reqwest sets the multipart content type,
    /// which takes precedence over the JSON default.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: multipart::Form,
    ) -> Result<T, ApiError> {
        self.send_json(self.request(Method::POST, path).multipart(form)).await
    }
}
