//! Single-proxy probe: one timed GET through one proxy

use crate::error::CheckerError;
use crate::proxy::checker::CheckerConfig;
use crate::proxy::models::{ProbeOutcome, ProxyRecord};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Certificate, Client, Proxy as ReqwestProxy, Request};
use std::time::Instant;
use tracing::debug;

/// Something that can test one proxy and report what happened.
///
/// Network failures are part of the returned outcome. `Err` is reserved for
/// failures to build the request at all.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, record: &ProxyRecord) -> Result<ProbeOutcome, CheckerError>;
}

/// Prober that sends a real HTTP request through the proxy
#[derive(Debug, Clone)]
pub struct HttpProber {
    config: CheckerConfig,
}

impl HttpProber {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Build a client that only talks through `record`, plus the GET to send.
    ///
    /// The proxy scheme comes from `record.proxy_type`.
    fn build_request(&self, record: &ProxyRecord) -> Result<(Client, Request), CheckerError> {
        let construction = |e: reqwest::Error| CheckerError::RequestConstruction(e.to_string());

        let proxy = ReqwestProxy::all(record.url()).map_err(construction)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        // no_proxy() first so environment proxies never override the one under test
        let mut builder = Client::builder()
            .no_proxy()
            .proxy(proxy)
            .user_agent(self.config.user_agent.as_str())
            .default_headers(headers)
            .timeout(self.config.timeout);

        for pem in &self.config.root_certificates {
            let cert = Certificate::from_pem(pem).map_err(construction)?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().map_err(construction)?;

        let request = client
            .get(self.config.test_url.as_str())
            .build()
            .map_err(construction)?;

        Ok((client, request))
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, record: &ProxyRecord) -> Result<ProbeOutcome, CheckerError> {
        let (client, request) = self.build_request(record)?;

        let start = Instant::now();
        let response = tokio::time::timeout(self.config.timeout, client.execute(request)).await;
        let elapsed = start.elapsed();

        let outcome = match response {
            Ok(Ok(response)) => {
                ProbeOutcome::completed(record.clone(), elapsed, response.status().as_u16())
            }
            Ok(Err(e)) => ProbeOutcome::transport_failed(record.clone(), elapsed, e.to_string()),
            Err(_) => ProbeOutcome::transport_failed(record.clone(), elapsed, "request timed out"),
        };

        debug!(
            proxy = %record,
            status = outcome.status_code(),
            elapsed_ms = outcome.elapsed_ms(),
            "probe finished"
        );

        Ok(outcome)
    }
}
