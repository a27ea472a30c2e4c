//! Error conditions raised by the checker

use std::path::PathBuf;

/// Domain errors. Transport failures are not listed here: they are recorded
/// in [`ProbeOutcome`](crate::proxy::ProbeOutcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error("malformed proxy line {line:?}: expected 2 or 4 fields, found {fields}")]
    MalformedProxyLine { line: String, fields: usize },

    #[error("failed to build request: {0}")]
    RequestConstruction(String),

    #[error("outcome stream closed after {received} of {expected} outcomes")]
    OutcomeStreamClosed { expected: usize, received: usize },

    #[error("invalid target url {0:?}: must start with https://")]
    InvalidTargetUrl(String),

    #[error("failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
