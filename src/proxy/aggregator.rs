//! Draining the completion channel into good and bad lists

use crate::error::CheckerError;
use crate::proxy::models::{Disposition, ProbeOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Receives every classification as soon as it is made
pub trait OutcomeSink: Send {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn record(&mut self, _outcome: &ProbeOutcome, _disposition: Disposition) {}
}

impl<S: OutcomeSink + ?Sized> OutcomeSink for Box<S> {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition) {
        (**self).record(outcome, disposition)
    }
}

/// Partitioned results of a batch, in completion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Raw forms of working and suspect proxies
    pub good: Vec<String>,
    /// Raw forms of failed proxies
    pub bad: Vec<String>,
    pub working: usize,
    pub suspect: usize,
    pub failed: usize,
}

impl CheckSummary {
    /// Classify one outcome and file it under good or bad
    pub fn push(&mut self, outcome: &ProbeOutcome) -> Disposition {
        let disposition = outcome.disposition();
        let raw = outcome.record.raw_form();

        match disposition {
            Disposition::Working => self.working += 1,
            Disposition::Suspect => self.suspect += 1,
            Disposition::Failed => self.failed += 1,
        }

        if disposition.is_good() {
            self.good.push(raw);
        } else {
            self.bad.push(raw);
        }

        disposition
    }

    pub fn total(&self) -> usize {
        self.good.len() + self.bad.len()
    }
}

/// Classify a fixed set of outcomes without a channel
pub fn classify_outcomes(outcomes: &[ProbeOutcome]) -> CheckSummary {
    let mut summary = CheckSummary::default();
    for outcome in outcomes {
        summary.push(outcome);
    }
    summary
}

/// Read exactly `expected` outcomes from `rx`, reporting each one to `sink`.
///
/// The receiver is closed once the last expected outcome is in. If every
/// sender goes away first, the shortfall is returned as
/// [`CheckerError::OutcomeStreamClosed`].
pub async fn aggregate<S>(
    mut rx: mpsc::UnboundedReceiver<ProbeOutcome>,
    expected: usize,
    sink: &mut S,
) -> Result<CheckSummary, CheckerError>
where
    S: OutcomeSink + ?Sized,
{
    let mut summary = CheckSummary::default();

    for received in 0..expected {
        let outcome = rx
            .recv()
            .await
            .ok_or(CheckerError::OutcomeStreamClosed { expected, received })?;

        let disposition = summary.push(&outcome);
        sink.record(&outcome, disposition);
    }

    rx.close();
    Ok(summary)
}
