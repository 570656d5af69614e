//! Retried HTTP connector over `api.php`, fronted by the SWR cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bifrost_cache::SwrCache;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Error;
use crate::params::ApiParams;

/// Default upstream endpoint.
pub const DEFAULT_BASE_URL: &str = "https://psychonautwiki.org/w/api.php";

/// User-Agent sent with every upstream request.
pub const USER_AGENT: &str = concat!(
    "bifrost/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/psychonautwiki/bifrost)"
);

/// Retry behavior of the connector.
///
/// The backoff is linear: before retry `n` (1-based) the connector sleeps
/// `backoff × n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub retries: u32,
    /// Backoff unit multiplied by the attempt number.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

/// The raw HTTP seam, mockable in tests.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Performs one GET against `url` and decodes the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, Error>;
}

/// Production transport over a shared [`reqwest::Client`] pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client with the gateway User-Agent and gzip enabled.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, Error> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.json().await?)
    }
}

/// Connector for the upstream MediaWiki API.
///
/// Every fetch goes through the SWR cache keyed on the fully-formed URL;
/// the producer behind a miss or refresh is a retried GET.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    cache: SwrCache<Value>,
    base_url: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Starts building a client; all parts have defaults.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// The configured upstream endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the parsed JSON response for `params`.
    ///
    /// Fresh cache hits and stale reads return without touching the
    /// network; only a first-ever miss awaits the HTTP round trip.
    pub async fn fetch(&self, params: ApiParams) -> Result<Value, Error> {
        let url = params.url(&self.base_url);
        let transport = Arc::clone(&self.transport);
        let retry = self.retry.clone();
        let producer_url = url.clone();
        self.cache
            .get(&url, move || async move {
                fetch_with_retry(transport, retry, producer_url).await
            })
            .await
    }
}

async fn fetch_with_retry(
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    url: String,
) -> Result<Value, Error> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match transport.get_json(&url).await {
            Ok(value) => {
                debug!(%url, attempt, "upstream fetch succeeded");
                return Ok(value);
            }
            Err(error) if attempt <= retry.retries => {
                warn!(%url, attempt, %error, "upstream fetch failed, retrying");
                tokio::time::sleep(retry.backoff * attempt).await;
            }
            Err(error) => {
                warn!(%url, attempt, %error, "upstream fetch failed, giving up");
                return Err(error);
            }
        }
    }
}

/// Builder for [`ApiClient`].
#[derive(Default)]
pub struct ApiClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    base_url: Option<String>,
    ttl: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl ApiClientBuilder {
    /// Overrides the upstream endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Overrides the cache TTL.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Overrides the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Swaps the HTTP seam, mainly for tests.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    pub fn build(self) -> ApiClient {
        ApiClient {
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            cache: self
                .ttl
                .map(SwrCache::new)
                .unwrap_or_default(),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            retry: self.retry.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FlakyTransport {
        calls: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn get_json(&self, url: &str) -> Result<Value, Error> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(Error::Status {
                    status: 503,
                    url: url.to_owned(),
                })
            } else {
                Ok(serde_json::json!({"ok": true}))
            }
        }
    }

    fn client(transport: Arc<FlakyTransport>) -> ApiClient {
        ApiClient::builder()
            .transport(transport)
            .retry(RetryPolicy {
                retries: 3,
                backoff: Duration::from_millis(1),
            })
            .build()
    }

    #[tokio::test]
    async fn two_failures_then_success_makes_three_attempts() {
        let transport = Arc::new(FlakyTransport {
            calls: AtomicUsize::new(0),
            failures: 2,
        });
        let client = client(Arc::clone(&transport));

        let value = client.fetch(ApiParams::ask("[[:LSD]]")).await.unwrap();
        assert_eq!(value, serde_json::json!({"ok": true}));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);

        // The value was stored; a second fetch is a cache hit.
        client.fetch(ApiParams::ask("[[:LSD]]")).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_exhausted_propagates_error() {
        let transport = Arc::new(FlakyTransport {
            calls: AtomicUsize::new(0),
            failures: 10,
        });
        let client = client(Arc::clone(&transport));

        let result = client.fetch(ApiParams::ask("[[:LSD]]")).await;
        assert!(matches!(result, Err(Error::Status { status: 503, .. })));
        // Initial attempt plus three retries.
        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
    }
}
