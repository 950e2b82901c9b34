#![allow(dead_code)]

use bytes::Bytes;
use logzio_sink::{DeliveryClient, DeliveryFailure};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

/// Delivery client that records every body it is handed and can be told to
/// fail specific calls (0-based).
#[derive(Clone, Default)]
pub struct RecordingClient {
    pub bodies: Arc<Mutex<Vec<String>>>,
    pub content_types: Arc<Mutex<Vec<&'static str>>>,
    pub releases: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    failing_calls: Arc<HashSet<usize>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            failing_calls: Arc::new(calls.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Records per request, in send order.
    pub fn batches(&self) -> Vec<Vec<Value>> {
        self.bodies.lock().iter().map(|body| parse_body(body)).collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }

    /// Rendered messages of every successfully delivered record.
    pub fn delivered_messages(&self) -> Vec<String> {
        let failing = self.failing_calls.clone();
        self.batches()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !failing.contains(i))
            .flat_map(|(_, batch)| batch)
            .map(|record| record["RenderedMessage"].as_str().unwrap().to_string())
            .collect()
    }
}

impl DeliveryClient for RecordingClient {
    async fn send(
        &self,
        url: &Url,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<(), DeliveryFailure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .push(String::from_utf8(body.to_vec()).unwrap());
        self.content_types.lock().push(content_type);

        if self.failing_calls.contains(&call) {
            return Err(DeliveryFailure::Status {
                status: 503,
                url: url.to_string(),
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Splits a request body back into its JSON objects.
pub fn parse_body(body: &str) -> Vec<Value> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split(",\n")
        .map(|object| serde_json::from_str(object).unwrap())
        .collect()
}

pub fn test_url() -> Url {
    Url::parse("http://localhost:8070/?token=test-token&type=rust").unwrap()
}
