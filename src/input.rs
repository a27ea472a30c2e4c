//! Where the target URL and the proxy list come from

use crate::error::CheckerError;
use crate::proxy::{ProxyParser, ProxyRecord, ProxyType};
use crate::Result;
use anyhow::Context;
use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Everything a batch needs before it can start
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub target_url: String,
    pub records: Vec<ProxyRecord>,
}

/// Accept only `https://` targets
pub fn validate_target_url(url: &str) -> std::result::Result<String, CheckerError> {
    let url = url.trim();
    if url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(CheckerError::InvalidTargetUrl(url.to_string()))
    }
}

/// Ask for the target URL on `input`, echoing the prompt to `output`
pub fn prompt_target_url<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    writeln!(
        output,
        "{}",
        "Enter the url you would like to test the proxies on (eg: https://example.com): ".cyan()
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(validate_target_url(&line)?)
}

/// Resolve the target URL (flag or prompt) and load the proxy list.
///
/// Both failures are fatal and happen before any probe is sent.
pub fn load_request(
    url: Option<String>,
    path: &Path,
    proxy_type: ProxyType,
) -> Result<CheckRequest> {
    let target_url = match url {
        Some(url) => validate_target_url(&url)?,
        None => prompt_target_url(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let records = ProxyParser::parse_file(path, proxy_type)
        .with_context(|| format!("failed to load proxies from {}", path.display()))?;

    Ok(CheckRequest {
        target_url,
        records,
    })
}
