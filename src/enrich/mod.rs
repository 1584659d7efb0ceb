//! Key -> value enrichment against remote lookup services.
//!
//! Every distinct key gets exactly one request. Requests run concurrently up
//! to a configured ceiling, and the call returns once all of them have
//! settled. A failed request maps its key to `None`; it never fails the batch.

pub mod frs;
pub mod naics;

#[cfg(test)]
mod canned;

pub use frs::*;
pub use naics::*;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::EnrichmentConfig;
use crate::error::LookupError;

/// Result of one enrichment call: one entry per requested key
pub type EnrichmentTable = HashMap<String, Option<String>>;

/// A remote service resolving one key to an optional value
#[async_trait]
pub trait KeyLookup: Send + Sync {
    /// Short service name used in logs
    fn service(&self) -> &'static str;

    /// `Ok(None)` means the service answered but had nothing for the key
    async fn lookup(&self, key: &str) -> Result<Option<String>, LookupError>;
}

/// Resolve every key in `keys`, at most `max_concurrency` requests in flight
pub async fn enrich<L>(lookup: &L, keys: &BTreeSet<String>, max_concurrency: usize) -> EnrichmentTable
where
    L: KeyLookup + ?Sized,
{
    if keys.is_empty() {
        return EnrichmentTable::new();
    }

    let service = lookup.service();
    info!(service, keys = keys.len(), "Enriching");

    let table: EnrichmentTable = stream::iter(keys.iter())
        .map(|key| async move {
            let value = match lookup.lookup(key).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(service, key = %key, error = %err, "Lookup failed");
                    None
                }
            };
            (key.clone(), value)
        })
        .buffer_unordered(max_concurrency.max(1))
        .collect()
        .await;

    let resolved = table.values().filter(|v| v.is_some()).count();
    info!(service, resolved, missing = table.len() - resolved, "Enrichment complete");

    table
}

/// Shared HTTP client for both lookup services
pub fn build_http_client(config: &EnrichmentConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeLookup {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl KeyLookup for FakeLookup {
        fn service(&self) -> &'static str {
            "fake"
        }

        async fn lookup(&self, key: &str) -> Result<Option<String>, LookupError> {
            self.calls.lock().unwrap().push(key.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match key {
                k if k.starts_with("fail") => Err(LookupError::Payload("boom".into())),
                k if k.starts_with("empty") => Ok(None),
                k => Ok(Some(format!("value-{}", k))),
            }
        }
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_output_keys_match_input_exactly() {
        let lookup = FakeLookup::new();
        let input = keys(&["a", "b", "fail-1", "empty-1", "c"]);

        let table = enrich(&lookup, &input, 8).await;

        let output: BTreeSet<String> = table.keys().cloned().collect();
        assert_eq!(output, input);
        assert_eq!(table["a"].as_deref(), Some("value-a"));
        assert_eq!(table["fail-1"], None);
        assert_eq!(table["empty-1"], None);
        assert_eq!(lookup.calls.lock().unwrap().len(), input.len());
    }

    #[tokio::test]
    async fn test_concurrency_is_capped() {
        let lookup = FakeLookup::new();
        let input: BTreeSet<String> = (0..20).map(|i| format!("k{}", i)).collect();

        let table = enrich(&lookup, &input, 3).await;

        assert_eq!(table.len(), 20);
        let peak = lookup.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight {}", peak);
        assert!(peak >= 2, "requests should overlap, peak {}", peak);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_requests() {
        let lookup = FakeLookup::new();
        let table = enrich(&lookup, &BTreeSet::new(), 4).await;
        assert!(table.is_empty());
        assert!(lookup.calls.lock().unwrap().is_empty());
    }
}
