//! HTTP client for the Supabase REST surface.
//!
//! Every request carries the project `apikey` header and runs under the
//! configured timeout. Callers choose which bearer token to send: a user's
//! access token for auth lookups, the service-role key for edge functions.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use audie_boutique_core::ports::StoreError;

/// Connection settings for the Supabase project.
#[derive(Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: Url,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: SecretString,
    /// Service-role key, used to call edge functions on behalf of staff.
    pub service_role_key: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("service_role_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Errors from Supabase HTTP calls.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The token or key was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Failed to parse response or build a request.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Timeout => Self::Timeout,
            SupabaseError::Http(e) if e.is_timeout() => Self::Timeout,
            SupabaseError::NotFound(what) => Self::NotFound(what),
            SupabaseError::Parse(msg) => Self::Malformed(msg),
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Shared Supabase HTTP client.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    service_role_key: SecretString,
}

impl SupabaseClient {
    /// Build a client from the project settings.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| SupabaseError::Parse(format!("invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                service_role_key: config.service_role_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| SupabaseError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// GET with a caller-supplied bearer token.
    pub(crate) async fn get_as<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        bearer: &str,
    ) -> Result<T, SupabaseError> {
        let url = self.endpoint(path)?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(classify)?;
        handle_response(response).await
    }

    /// POST a JSON body with the service-role key.
    pub(crate) async fn post_service<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), SupabaseError> {
        let url = self.endpoint(path)?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(self.inner.service_role_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(classify)?;
        expect_success(response).await
    }

    /// POST a multipart form with the service-role key.
    pub(crate) async fn post_multipart_service(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<(), SupabaseError> {
        let url = self.endpoint(path)?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(self.inner.service_role_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(classify)?;
        expect_success(response).await
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn classify(err: reqwest::Error) -> SupabaseError {
    if err.is_timeout() {
        SupabaseError::Timeout
    } else {
        SupabaseError::Http(err)
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SupabaseError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(format!("failed to parse response: {e}")));
    }
    Err(parse_error(response).await)
}

async fn expect_success(response: reqwest::Response) -> Result<(), SupabaseError> {
    if response.status().is_success() {
        return Ok(());
    }
    Err(parse_error(response).await)
}

async fn parse_error(response: reqwest::Response) -> SupabaseError {
    let status = response.status().as_u16();

    if status == 401 || status == 403 {
        return SupabaseError::Unauthorized;
    }
    if status == 404 {
        return SupabaseError::NotFound(response.url().path().to_owned());
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    SupabaseError::Api { status, message }
}
