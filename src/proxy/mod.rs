//! Proxy module for parsing and checking proxies
//!
//! This module provides functionality for:
//! - Parsing proxies from IP:PORT and IP:PORT:USER:PASS lines
//! - Probing every proxy concurrently through one HTTP request each
//! - Classifying results as working, suspect or failed
//! - Saving good and bad proxies to separate files

pub mod aggregator;
pub mod checker;
pub mod dispatcher;
pub mod models;
pub mod parser;
pub mod prober;

pub use aggregator::{aggregate, classify_outcomes, CheckSummary, NullSink, OutcomeSink};
pub use checker::{CheckerConfig, ProxyChecker};
pub use dispatcher::{dispatch, dispatch_into};
pub use models::{Disposition, ProbeOutcome, ProxyAuth, ProxyRecord, ProxyType, NO_STATUS};
pub use parser::ProxyParser;
pub use prober::{HttpProber, Prober};
