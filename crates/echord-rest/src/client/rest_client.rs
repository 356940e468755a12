//! REST client
//!
//! Builds authenticated JSON requests and runs them through the dispatcher,
//! translating HTTP responses into dispatcher outcomes.

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::config::RestConfig;
use crate::error::{DispatchError, RestError, RestResult};
use crate::ratelimit::{
    parse_seconds, seconds, Completed, Dispatcher, DispatcherConfig, OperationError, RateLimitHeaders,
    Route,
};

const AUDIT_LOG_REASON: &str = "x-audit-log-reason";
const GLOBAL: &str = "x-ratelimit-global";

/// Wait used when a 429 carries no retry hint
const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Recorded in the guild audit log
    pub reason: Option<String>,
}

impl RequestOptions {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
    #[serde(default)]
    global: bool,
}

/// REST API client
///
/// Cheap to clone; clones share the HTTP connection pool and the dispatcher.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: Arc<RestConfig>,
    dispatcher: Dispatcher,
}

impl RestClient {
    /// Create a client with its own dispatcher
    pub fn new(config: RestConfig, limits: DispatcherConfig) -> Result<Self, RestError> {
        Self::with_dispatcher(config, Dispatcher::new(limits))
    }

    /// Create a client that shares an existing dispatcher
    pub fn with_dispatcher(config: RestConfig, dispatcher: Dispatcher) -> Result<Self, RestError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(config),
            dispatcher,
        })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Issue a request through the dispatcher
    ///
    /// 429 responses are retried transparently; any other failure is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> RestResult<Value> {
        if !path.starts_with('/') {
            return Err(DispatchError::Operation(RestError::InvalidRoute(
                path.to_string(),
            )));
        }

        let route = Route::new(method, path);
        let client = self.clone();
        let attempt_route = route.clone();

        self.dispatcher
            .submit_route(&route, move || {
                let client = client.clone();
                let route = attempt_route.clone();
                let body = body.clone();
                let options = options.clone();
                async move { client.execute(&route, body.as_ref(), &options).await }
            })
            .await
    }

    /// Perform one HTTP attempt without queueing
    pub async fn execute(
        &self,
        route: &Route,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<Completed<Value>, OperationError<RestError>> {
        let mut request = self
            .http
            .request(route.method().clone(), self.config.url(route.path()))
            .header(AUTHORIZATION, self.config.authorization())
            .header(CONTENT_TYPE, "application/json");

        if let Some(reason) = &options.reason {
            request = request.header(AUDIT_LOG_REASON, reason);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OperationError::Failed(RestError::Network(e)))?;

        let status = response.status();
        let headers = RateLimitHeaders::from_headers(response.headers());
        debug!(route = %route, status = status.as_u16(), "REST request completed");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let (retry_header, global_header) = throttle_hints(response.headers());
            let body: Option<RateLimitBody> = response.json().await.ok();

            let retry_after = retry_delay(body.as_ref(), retry_header);
            let global = global_header || body.is_some_and(|b| b.global);

            return Err(OperationError::RateLimited {
                retry_after,
                global,
                headers,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| OperationError::Failed(RestError::Network(e)))?;

        if !status.is_success() {
            return Err(OperationError::Failed(RestError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }));
        }

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| OperationError::Failed(RestError::Decode(e)))?
        };

        Ok(Completed { value, headers })
    }

    pub async fn get(&self, path: &str) -> RestResult<Value> {
        self.request(Method::GET, path, None, RequestOptions::default())
            .await
    }

    /// GET and decode into `T`
    pub async fn get_as<T: DeserializeOwned>(&self, path: &str) -> RestResult<T> {
        let value = self.get(path).await?;
        serde_json::from_value(value).map_err(|e| DispatchError::Operation(RestError::Decode(e)))
    }

    pub async fn post(&self, path: &str, body: Value) -> RestResult<Value> {
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> RestResult<Value> {
        self.request(Method::PUT, path, body, RequestOptions::default())
            .await
    }

    pub async fn patch(&self, path: &str, body: Value) -> RestResult<Value> {
        self.request(Method::PATCH, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> RestResult<Value> {
        self.request(Method::DELETE, path, None, RequestOptions::default())
            .await
    }
}

/// Delay before retrying a 429: the body's `retry_after`, then the
/// `Retry-After` header, then [`FALLBACK_RETRY_AFTER`]
fn retry_delay(body: Option<&RateLimitBody>, header: Option<Duration>) -> Duration {
    body.and_then(|b| b.retry_after)
        .and_then(seconds)
        .or(header)
        .unwrap_or(FALLBACK_RETRY_AFTER)
}

/// `Retry-After` (seconds) and `X-RateLimit-Global` from a 429 response
fn throttle_hints(headers: &HeaderMap) -> (Option<Duration>, bool) {
    let retry_after = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_seconds);
    let global = headers
        .get(GLOBAL)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    (retry_after, global)
}
