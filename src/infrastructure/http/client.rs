use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{ApiError, DomainError};

/// REST API version sent with every request
pub const API_VERSION: &str = "7.1";

/// Maximum number of error body characters kept in an `ApiError`
const MAX_ERROR_BODY: usize = 500;

/// Trait for HTTP client operations (for mocking)
///
/// Paths are relative to the organization URL and start with `/`.
#[async_trait]
pub trait DevOpsHttpClient: Send + Sync + fmt::Debug {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
}

/// `{ "count": n, "value": [...] }` envelope used by list endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ValueList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Deserializes a response body into a typed value
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::decode(e.to_string()))
}

/// Percent-encodes a single path or query component
pub fn encode(component: &str) -> String {
    urlencoding::encode(component).into_owned()
}

#[derive(Clone)]
pub struct HttpClientConfig {
    /// e.g. `https://dev.azure.com/fabrikam`
    pub organization_url: String,
    pub personal_access_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("organization_url", &self.organization_url)
            .field("personal_access_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Real HTTP client using reqwest
#[derive(Clone)]
pub struct ReqwestDevOpsClient {
    client: reqwest::Client,
    base_url: String,
    personal_access_token: String,
}

impl ReqwestDevOpsClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.organization_url.trim_end_matches('/').to_string(),
            personal_access_token: config.personal_access_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .basic_auth("", Some(&self.personal_access_token))
            .header(ACCEPT, format!("application/json;api-version={}", API_VERSION))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = body.chars().take(MAX_ERROR_BODY).collect::<String>();

            return Err(ApiError::status(status.as_u16(), message));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::timeout(e.to_string())
            } else {
                ApiError::decode(e.to_string())
            }
        })
    }
}

impl fmt::Debug for ReqwestDevOpsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestDevOpsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DevOpsHttpClient for ReqwestDevOpsClient {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }
}

/// Timeouts surface as connection-aborted; everything else as a network failure
fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(error.to_string())
    } else {
        ApiError::network(error.to_string())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted client. Each path has a queue of outcomes; the last one
    /// repeats once the queue is down to a single entry.
    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
        calls: Mutex<Vec<String>>,
        posted: Mutex<Vec<(String, Value)>>,
        latency: Option<Duration>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, path: impl Into<String>, response: Value) -> Self {
            self.push(path.into(), Ok(response));
            self
        }

        pub fn with_error(self, path: impl Into<String>, error: ApiError) -> Self {
            self.push(path.into(), Err(error));
            self
        }

        /// Every call sleeps for `latency`, so overlapping calls can be observed
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        pub fn call_count(&self, path: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|p| *p == path).count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn posted_bodies(&self, path: &str) -> Vec<Value> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .filter(|(p, _)| p == path)
                .map(|(_, body)| body.clone())
                .collect()
        }

        /// Highest number of calls that were in progress at the same time
        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        fn push(&self, path: String, outcome: Result<Value, ApiError>) {
            self.responses
                .lock()
                .unwrap()
                .entry(path)
                .or_default()
                .push_back(outcome);
        }

        fn next(&self, path: &str) -> Result<Value, ApiError> {
            let mut responses = self.responses.lock().unwrap();

            match responses.get_mut(path) {
                Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                Some(queue) => queue.front().cloned().unwrap(),
                None => Err(ApiError::status(404, format!("No mock response for {}", path))),
            }
        }

        async fn respond(&self, path: &str) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push(path.to_string());

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.next(path)
        }
    }

    #[async_trait]
    impl DevOpsHttpClient for MockHttpClient {
        async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
            self.respond(path).await
        }

        async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
            self.posted
                .lock()
                .unwrap()
                .push((path.to_string(), body.clone()));
            self.respond(path).await
        }
    }
}
