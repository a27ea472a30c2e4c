//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status code reported when a probe never obtained a response
pub const NO_STATUS: i32 = -1;

/// Proxy type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// A single proxy endpoint under test.
///
/// The port is kept exactly as it was read so the raw form reproduces the
/// input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub host: String,
    pub port: String,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl ProxyRecord {
    /// Create a new proxy record without authentication
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            proxy_type: ProxyType::default(),
            auth: None,
        }
    }

    /// Create a new proxy record with authentication
    pub fn with_auth(
        host: impl Into<String>,
        port: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            proxy_type: ProxyType::default(),
            auth: Some(ProxyAuth::new(username.into(), password.into())),
        }
    }

    pub fn with_proxy_type(mut self, proxy_type: ProxyType) -> Self {
        self.proxy_type = proxy_type;
        self
    }

    /// `host:port` or `host:port:user:pass`, used for reporting and saving
    pub fn raw_form(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "{}:{}:{}:{}",
                self.host, self.port, auth.username, auth.password
            ),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    /// `host:port` or `user:pass@host:port`, the proxy target after the scheme
    pub fn connection_form(&self) -> String {
        match &self.auth {
            Some(auth) => format!(
                "{}:{}@{}:{}",
                auth.username, auth.password, self.host, self.port
            ),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    /// Full proxy URL handed to the HTTP client
    pub fn url(&self) -> String {
        format!("{}://{}", self.proxy_type, self.connection_form())
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw_form())
    }
}

/// Result of probing one proxy record.
///
/// Built only through [`ProbeOutcome::completed`] and
/// [`ProbeOutcome::transport_failed`], so a status code is present exactly
/// when the transport succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub record: ProxyRecord,
    pub elapsed: Duration,
    status: Option<u16>,
    failure: Option<String>,
}

impl ProbeOutcome {
    /// The request went through the proxy and the remote answered with `status`
    pub fn completed(record: ProxyRecord, elapsed: Duration, status: u16) -> Self {
        Self {
            record,
            elapsed,
            status: Some(status),
            failure: None,
        }
    }

    /// The request never produced a response
    pub fn transport_failed(
        record: ProxyRecord,
        elapsed: Duration,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            record,
            elapsed,
            status: None,
            failure: Some(reason.into()),
        }
    }

    pub fn transport_ok(&self) -> bool {
        self.status.is_some()
    }

    /// Remote status code, or [`NO_STATUS`] when no response was obtained
    pub fn status_code(&self) -> i32 {
        self.status.map_or(NO_STATUS, i32::from)
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    pub fn disposition(&self) -> Disposition {
        Disposition::classify(self.transport_ok(), self.status_code())
    }
}

/// Three-way classification of a probe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Transport succeeded and the status was 200..=399
    Working,
    /// The proxy carried the request but the destination refused or errored
    Suspect,
    /// No response came back through the proxy
    Failed,
}

impl Disposition {
    pub fn classify(transport_ok: bool, status: i32) -> Self {
        match (transport_ok, status) {
            (false, _) => Disposition::Failed,
            (true, 200..=399) => Disposition::Working,
            (true, _) => Disposition::Suspect,
        }
    }

    /// Working and suspect proxies both count as usable
    pub fn is_good(self) -> bool {
        !matches!(self, Disposition::Failed)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Working => write!(f, "working"),
            Disposition::Suspect => write!(f, "suspect"),
            Disposition::Failed => write!(f, "failed"),
        }
    }
}
