//! Proxy Probe - concurrent proxy checker
//!
//! Sends one HTTP request through every proxy in a list at the same time and
//! sorts the proxies into good (working or suspect) and bad (failed) lists.

pub mod error;
pub mod input;
pub mod proxy;
pub mod report;
pub mod tui;

pub use error::CheckerError;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
