use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::endpoint::redact_token;
use crate::domain::ConfigError;

// Longest response body excerpt carried in a failure message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Outcome of a single failed send.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryFailure {
    #[error("Received failed HTTP response: {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("Request to {url} timed out: {message}")]
    Timeout { url: String, message: String },
    #[error("Transport error sending to {url}: {message}")]
    Transport { url: String, message: String },
    #[error("Client released, cannot send to {url}")]
    Released { url: String },
}

impl DeliveryFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            DeliveryFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a later attempt might succeed. The engine never retries a
    /// batch; this only feeds diagnostics.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryFailure::Timeout { .. } | DeliveryFailure::Transport { .. } => true,
            DeliveryFailure::Status { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            DeliveryFailure::Released { .. } => false,
        }
    }
}

/// One network send of an encoded batch.
///
/// The engine awaits each `send` before starting the next cycle, so
/// implementations never see concurrent calls from the same engine.
pub trait DeliveryClient: Send + Sync + 'static {
    fn send(
        &self,
        url: &Url,
        body: Bytes,
        content_type: &'static str,
    ) -> impl Future<Output = Result<(), DeliveryFailure>> + Send;

    /// Releases the underlying connection resources. Called exactly once by
    /// the engine when its worker stops.
    fn release(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: format!("logzio-sink/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
}

#[derive(Debug)]
pub struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    total_response_time: AtomicU64,
}

impl ClientStats {
    fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            total_response_time: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self, success: bool, response_time: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time
            .fetch_add(response_time.as_millis() as u64, Ordering::Relaxed);

        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> ConnectionStats {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_response_time = self.total_response_time.load(Ordering::Relaxed);

        let average_response_time = if total_requests > 0 {
            Duration::from_millis(total_response_time / total_requests)
        } else {
            Duration::ZERO
        };

        ConnectionStats {
            total_requests,
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            average_response_time,
        }
    }
}

/// reqwest-backed delivery client. The connection pool lives until
/// `release` is called.
#[derive(Debug)]
pub struct HttpDeliveryClient {
    client: Option<Client>,
    stats: Arc<ClientStats>,
}

impl HttpDeliveryClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ConfigError::HttpClient(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client: Some(client),
            stats: Arc::new(ClientStats::new()),
        })
    }

    /// Shared handle to the request counters; stays readable after the
    /// client moved into the engine.
    pub fn stats(&self) -> Arc<ClientStats> {
        self.stats.clone()
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.stats.snapshot()
    }

    pub fn is_released(&self) -> bool {
        self.client.is_none()
    }
}

impl DeliveryClient for HttpDeliveryClient {
    async fn send(
        &self,
        url: &Url,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<(), DeliveryFailure> {
        let Some(client) = &self.client else {
            return Err(DeliveryFailure::Released {
                url: redact_token(url),
            });
        };

        let start = Instant::now();
        let bytes_sent = body.len();

        let response = client
            .post(url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_request(false, start.elapsed());
                let timed_out = e.is_timeout();
                // reqwest includes the full URL in its message
                let message = e.without_url().to_string();
                return Err(if timed_out {
                    DeliveryFailure::Timeout {
                        url: redact_token(url),
                        message,
                    }
                } else {
                    DeliveryFailure::Transport {
                        url: redact_token(url),
                        message,
                    }
                });
            }
        };

        let status = response.status();
        let success = status.is_success();
        self.stats.record_request(success, start.elapsed());

        if success {
            debug!(
                status = status.as_u16(),
                bytes_sent,
                latency_ms = start.elapsed().as_millis() as u64,
                "Batch accepted"
            );
            return Ok(());
        }

        let message = match response.text().await {
            Ok(text) if !text.is_empty() => text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            _ => status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        };

        Err(DeliveryFailure::Status {
            status: status.as_u16(),
            url: redact_token(url),
            message,
        })
    }

    fn release(&mut self) {
        if self.client.take().is_some() {
            debug!("HTTP delivery client released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transient_failures() {
        let status = |status| DeliveryFailure::Status {
            status,
            url: "http://x".into(),
            message: String::new(),
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(
            DeliveryFailure::Timeout {
                url: "http://x".into(),
                message: String::new()
            }
            .is_transient()
        );
        assert_eq!(status(404).status(), Some(404));
    }

    #[tokio::test]
    async fn send_after_release_fails() {
        let mut client = HttpDeliveryClient::new(ClientConfig::default()).unwrap();
        client.release();
        client.release();
        assert!(client.is_released());

        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = client.send(&url, Bytes::from_static(b"{}"), "application/json").await;
        assert!(matches!(result, Err(DeliveryFailure::Released { .. })));
    }
}
