use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, Url};
use tracing::debug;
use weekplan_domain::PlanError;

use crate::errors::{status_error, InfraError};

/// HTTP client with a request timeout and request logging.
///
/// Every request is sent once: planning runs retry at the granularity of
/// one calendar insertion, not one HTTP request.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, PlanError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder.
    ///
    /// Any HTTP status is returned as a response; only transport failures
    /// become errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, PlanError> {
        let request = builder.build().map_err(|err| PlanError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = redact_query(request.url());
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Pass a successful response through; turn anything else into a domain
/// error carrying the status and a body excerpt.
pub async fn ensure_success(response: Response) -> Result<Response, PlanError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body))
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("weekplan/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout covering connect, send and body
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient, PlanError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| PlanError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

/// Base URL with percent-encoded path segments appended
///
/// # Errors
/// Returns `PlanError::Config` when the base is not an absolute URL.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url, PlanError> {
    let mut url = Url::parse(base)
        .map_err(|e| PlanError::config(format!("invalid API base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| PlanError::config(format!("API base URL cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// URL for logging with query values dropped (they may carry dates or ids
/// but never belong in logs verbatim).
fn redact_query(url: &reqwest::Url) -> String {
    let mut shown = url.clone();
    if shown.query().is_some() {
        shown.set_query(Some("..."));
    }
    shown.to_string()
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Method, StatusCode};
    use wiremock::matchers::{header_regex, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn returns_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_regex("user-agent", "^weekplan/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn server_errors_are_returned_after_a_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn ensure_success_maps_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = HttpClient::new().expect("http client");
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(
            ensure_success(response).await.unwrap_err(),
            PlanError::Api { status: 429, message: "slow down".into() }
        );
    }

    #[tokio::test]
    async fn connection_failure_is_a_retryable_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = format!("http://{addr}");

        let client = HttpClient::new().expect("http client");
        match client.send(client.request(Method::GET, &url)).await {
            Err(err @ PlanError::Transport { .. }) => assert!(err.is_retryable()),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn endpoint_encodes_path_segments() {
        let url = endpoint(
            "https://example.test/calendar/v3/",
            &["calendars", "abc#x@group.calendar", "events"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/calendar/v3/calendars/abc%23x@group.calendar/events"
        );
    }

    #[test]
    fn endpoint_rejects_relative_bases() {
        assert!(matches!(endpoint("not a url", &["x"]), Err(PlanError::Config { .. })));
    }

    #[test]
    fn redacts_query_strings() {
        let url = reqwest::Url::parse("https://example.com/events?timeMin=2025").unwrap();
        assert_eq!(redact_query(&url), "https://example.com/events?...");
    }
}
