//! Proxy parser module for loading and saving proxy lists

use crate::error::CheckerError;
use crate::proxy::models::{ProxyRecord, ProxyType};
use crate::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Proxy parser for parsing proxies from strings and files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy line
    ///
    /// Supports formats:
    /// - IP:PORT
    /// - IP:PORT:USER:PASS
    pub fn parse_line(line: &str) -> std::result::Result<ProxyRecord, CheckerError> {
        let trimmed = line.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();

        let malformed = || CheckerError::MalformedProxyLine {
            line: trimmed.to_string(),
            fields: parts.len(),
        };

        if parts.iter().any(|part| part.is_empty()) {
            return Err(malformed());
        }

        match parts.as_slice() {
            [host, port] => Ok(ProxyRecord::new(*host, *port)),
            [host, port, username, password] => {
                Ok(ProxyRecord::with_auth(*host, *port, *username, *password))
            }
            _ => Err(malformed()),
        }
    }

    /// Parse proxies from a string (multiple lines), skipping malformed ones
    pub fn parse_string(content: &str, proxy_type: ProxyType) -> Vec<ProxyRecord> {
        content
            .lines()
            .filter_map(|line| match Self::parse_line(line) {
                Ok(record) => Some(record.with_proxy_type(proxy_type)),
                Err(e) => {
                    debug!("skipping line: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Parse proxies from a file
    pub fn parse_file<P: AsRef<Path>>(path: P, proxy_type: ProxyType) -> Result<Vec<ProxyRecord>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse_string(&content, proxy_type))
    }

    /// Append raw-form proxy lines to a file, creating it if needed
    pub fn append_to_file<P: AsRef<Path>>(
        lines: &[String],
        path: P,
    ) -> std::result::Result<(), CheckerError> {
        let path = path.as_ref();
        let persistence = |source| CheckerError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(persistence)?;

        for line in lines {
            writeln!(file, "{}", line).map_err(persistence)?;
        }
        file.flush().map_err(persistence)?;

        Ok(())
    }
}
