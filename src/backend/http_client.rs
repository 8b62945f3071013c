//! HTTP transport for the auth backend
//!
//! This module provides a thin reqwest client bound to one backend base URL and
//! the [`HttpAuthBackend`] built on it. Requests are issued exactly once:
//! retry policy belongs to the caller (see [`crate::session::retry`]).

use super::AuthBackend;
use crate::config::BackendConfig;
use crate::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, PERMISSIONS_PATH, VERIFY_TOKEN_PATH,
};
use crate::error::{GateError, GateResult};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP client bound to a single backend base URL
#[derive(Debug, Clone)]
pub struct BackendHttpClient {
    /// Underlying HTTP client
    client: Client,
    /// Base URL every endpoint path is appended to
    base_url: Url,
}

impl BackendHttpClient {
    /// Create a new client for `base_url` with the given timeout and user agent
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> GateResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            GateError::InvalidArgument(format!("Invalid backend URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| GateError::InvalidArgument(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Resolve an endpoint path against the base URL, keeping any path prefix
    /// the base URL already carries (e.g. `https://host/api`).
    pub fn endpoint(&self, path: &str) -> GateResult<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| GateError::InvalidArgument(format!("Invalid endpoint '{}': {}", joined, e)))
    }

    /// Issue a single GET and return the status with the raw body.
    ///
    /// Transport failures (connect, timeout, body read) map to `Unavailable`.
    pub async fn get(&self, url: Url, bearer: Option<&str>) -> GateResult<(StatusCode, String)> {
        debug!("GET {}", url.path());
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GateError::Unavailable(format!("HTTP request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GateError::Unavailable(format!("Failed to read response body: {}", e)))?;

        Ok((status, body))
    }
}

/// Maps a non-success status to the error taxonomy.
///
/// 401 and 403 mean the token was rejected; everything else is an endpoint failure.
pub fn classify_status(status: StatusCode, body: &str) -> GateError {
    let detail = if body.trim().is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), body.trim())
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GateError::Unauthenticated(detail),
        _ => GateError::Unavailable(detail),
    }
}

/// Builder for creating backend HTTP clients
pub struct HttpClientBuilder {
    timeout_secs: u64,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Create a new HTTP client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout
    pub fn timeout_secs(mut self, timeout: u64) -> Self {
        self.timeout_secs = timeout;
        self
    }

    /// Set the user agent sent with every request
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build a client for the given base URL
    pub fn build(self, base_url: &str) -> GateResult<BackendHttpClient> {
        BackendHttpClient::new(base_url, self.timeout_secs, &self.user_agent)
    }
}

/// Interprets the body of a 2xx verification response.
///
/// The status is the verified indicator and a body that is not JSON at all
/// leaves it standing. JSON must not contradict it: `"valid": false` (or a
/// bare `false`) is a rejection, and a `valid` member that is not a boolean
/// is a malformed reply.
pub fn interpret_verify_body(body: &str) -> GateResult<()> {
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) if !looks_like_json(body) && (e.is_syntax() || e.is_eof()) => {
            debug!("Verification body is not JSON ({}); relying on status", e);
            return Ok(());
        }
        Err(e) => {
            return Err(GateError::Unavailable(format!(
                "Unreadable verification response: {}",
                e
            )))
        }
    };

    let valid = match &value {
        Value::Object(fields) => match fields.get("valid") {
            None => return Ok(()),
            Some(Value::Bool(valid)) => *valid,
            Some(other) => {
                warn!("Verification response has non-boolean 'valid': {}", other);
                return Err(GateError::Unavailable(format!(
                    "Malformed verification response: 'valid' is {}",
                    other
                )));
            }
        },
        Value::Bool(valid) => *valid,
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(GateError::Unauthenticated(
            "Token verification returned valid=false".to_string(),
        ))
    }
}

fn looks_like_json(body: &str) -> bool {
    matches!(body.trim_start().chars().next(), Some('{') | Some('['))
}

/// Accepted shapes of the permissions payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PermissionsPayload {
    List(Vec<String>),
    Wrapped { permissions: Vec<String> },
}

impl PermissionsPayload {
    fn into_names(self) -> Vec<String> {
        match self {
            PermissionsPayload::List(names) => names,
            PermissionsPayload::Wrapped { permissions } => permissions,
        }
    }
}

/// [`AuthBackend`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    http: BackendHttpClient,
}

impl HttpAuthBackend {
    pub fn new(http: BackendHttpClient) -> Self {
        Self { http }
    }

    pub fn from_config(config: &BackendConfig) -> GateResult<Self> {
        let http = HttpClientBuilder::new()
            .timeout_secs(config.timeout_secs)
            .user_agent(config.user_agent.clone())
            .build(&config.base_url)?;
        Ok(Self::new(http))
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn verify_token(&self, token: &str) -> GateResult<()> {
        let mut url = self.http.endpoint(VERIFY_TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("token", token);

        let (status, body) = self.http.get(url, None).await?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        interpret_verify_body(&body)
    }

    async fn fetch_permissions(&self, token: &str) -> GateResult<Vec<String>> {
        let url = self.http.endpoint(PERMISSIONS_PATH)?;
        let (status, body) = self.http.get(url, Some(token)).await?;
        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        serde_json::from_str::<PermissionsPayload>(&body)
            .map(PermissionsPayload::into_names)
            .map_err(|e| {
                warn!("Malformed permissions payload: {}", e);
                GateError::Unavailable(format!("Malformed permissions payload: {}", e))
            })
    }
}
