use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    retryable: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Outgoing GET request envelope used by scraper transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Response envelope returned by a scraper transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub fn json(&self) -> Result<Value, HttpError> {
        serde_json::from_str(&self.body)
            .map_err(|error| HttpError::non_retryable(format!("response body is not valid JSON: {error}")))
    }
}

/// Scraper transport contract.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Browser-like header profile. Several bookmaker origins reject requests
/// that do not carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub extra: BTreeMap<String, String>,
}

impl BrowserProfile {
    /// Full desktop profile for origins with aggressive bot filtering.
    pub fn desktop_chrome() -> Self {
        Self {
            user_agent: String::from(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
            ),
            accept: String::from("*/*"),
            accept_language: String::from("en-GB,en-US;q=0.9,en;q=0.8"),
            extra: BTreeMap::new(),
        }
    }

    /// Minimal profile for origins that only require a user agent.
    pub fn minimal() -> Self {
        Self {
            user_agent: String::from("Mozilla/5.0"),
            accept: String::from("application/json"),
            accept_language: String::from("en"),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn apply(&self, request: HttpRequest) -> HttpRequest {
        let mut request = request
            .with_header("user-agent", self.user_agent.as_str())
            .with_header("accept", self.accept.as_str())
            .with_header("accept-language", self.accept_language.as_str());
        for (name, value) in &self.extra {
            request = request.with_header(name.as_str(), value.as_str());
        }
        request
    }
}

/// Production transport. Keeps a cookie store because some origins gate on
/// session cookies handed out by their first response.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .cookie_store(true)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            builder = builder.timeout(std::time::Duration::from_millis(request.timeout_ms));

            let response = builder.send().await.map_err(|error| {
                if error.is_timeout() {
                    HttpError::new(format!("request timeout: {error}"))
                } else if error.is_connect() {
                    HttpError::new(format!("connection failed: {error}"))
                } else {
                    HttpError::new(format!("request failed: {error}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|error| HttpError::new(format!("failed to read response body: {error}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Deterministic transport replaying queued responses, for offline tests.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: impl Into<String>) {
        self.push(Ok(HttpResponse::ok_json(body)));
    }

    pub fn push_status(&self, status: u16, body: impl Into<String>) {
        self.push(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
    }

    pub fn push_err(&self, error: HttpError) {
        self.push(Err(error));
    }

    fn push(&self, response: Result<HttpResponse, HttpError>) {
        self.responses
            .lock()
            .expect("scripted responses should not be poisoned")
            .push_back(response);
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let next = self
            .responses
            .lock()
            .expect("scripted responses should not be poisoned")
            .pop_front();
        Box::pin(async move {
            next.unwrap_or_else(|| Err(HttpError::new("scripted client has no more responses")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_profile_populates_headers() {
        let request = BrowserProfile::desktop_chrome()
            .with_header("X-Pawa-Brand", "betpawa-ghana")
            .apply(HttpRequest::get("https://example.test/events"));

        assert!(request
            .headers
            .get("user-agent")
            .is_some_and(|ua| ua.contains("Chrome")));
        assert_eq!(
            request.headers.get("x-pawa-brand").map(String::as_str),
            Some("betpawa-ghana")
        );
    }

    #[test]
    fn retryable_flag_separates_transport_from_payload_errors() {
        assert!(HttpError::new("connection reset").retryable());
        assert!(!HttpError::non_retryable("bad payload").retryable());

        let response = HttpResponse::ok_json("{not json");
        let err = response.json().expect_err("must fail");
        assert!(!err.retryable());
    }

    #[tokio::test]
    async fn scripted_client_replays_in_order() {
        let client = ScriptedHttpClient::new();
        client.push_ok("[1]");
        client.push_status(503, "upstream unavailable");

        let first = client
            .execute(HttpRequest::get("https://example.test"))
            .await
            .expect("first response is ok");
        assert_eq!(first.body, "[1]");

        let second = client
            .execute(HttpRequest::get("https://example.test"))
            .await
            .expect("second response is ok");
        assert_eq!(second.status, 503);

        let third = client.execute(HttpRequest::get("https://example.test")).await;
        assert!(third.is_err(), "exhausted script must error");
    }
}
