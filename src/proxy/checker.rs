//! Proxy checker module: configuration and the batch driver

use crate::proxy::aggregator::{aggregate, CheckSummary, OutcomeSink};
use crate::proxy::dispatcher::dispatch_into;
use crate::proxy::models::ProxyRecord;
use crate::proxy::prober::{HttpProber, Prober};
use crate::Result;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default URL to test proxies against
const DEFAULT_TEST_URL: &str = "https://example.com";

/// Browser user agent; many sites answer default client signatures with
/// statuses that say nothing about the proxy
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/79.0.3945.117 Safari/537.36";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Maximum checks in flight, `None` for no limit
    pub concurrency: Option<usize>,
    /// URL to test proxies against
    pub test_url: String,
    /// Extra PEM root certificates trusted for the target URL
    pub root_certificates: Vec<Vec<u8>>,
    /// User-Agent header sent with every probe
    pub user_agent: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: None,
            test_url: DEFAULT_TEST_URL.to_string(),
            root_certificates: Vec::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    /// Trust an extra PEM root certificate, e.g. a corporate interception CA
    pub fn with_root_certificate(mut self, pem: Vec<u8>) -> Self {
        self.root_certificates.push(pem);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Runs a whole batch: starts the aggregator, dispatches every probe, then
/// waits on the aggregator
pub struct ProxyChecker {
    config: CheckerConfig,
    prober: Arc<dyn Prober>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        let prober = Arc::new(HttpProber::new(config.clone()));
        Self { config, prober }
    }

    /// Create a checker that probes with something other than HTTP
    pub fn with_prober(config: CheckerConfig, prober: Arc<dyn Prober>) -> Self {
        Self { config, prober }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check every record and return the good/bad partition.
    ///
    /// `sink` sees each classification as it happens. The call returns only
    /// once one outcome per record has been consumed.
    pub async fn run<S>(&self, records: Vec<ProxyRecord>, mut sink: S) -> Result<CheckSummary>
    where
        S: OutcomeSink + 'static,
    {
        info!(
            proxies = records.len(),
            test_url = %self.config.test_url,
            "starting proxy check"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let expected = records.len();

        let aggregator = tokio::spawn(async move { aggregate(rx, expected, &mut sink).await });

        dispatch_into(Arc::clone(&self.prober), records, self.config.concurrency, tx);

        let summary = aggregator.await.context("aggregator task panicked")??;

        info!(
            working = summary.working,
            suspect = summary.suspect,
            failed = summary.failed,
            "proxy check finished"
        );

        Ok(summary)
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
