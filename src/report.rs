//! Per-result reporting sinks

use crate::proxy::{Disposition, OutcomeSink, ProbeOutcome};
use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Status line for one classified outcome, without styling
pub fn status_line(outcome: &ProbeOutcome, disposition: Disposition) -> String {
    match disposition {
        Disposition::Working => format!(
            "Status: OK ({}) | Speed: {:.2?}",
            outcome.status_code(),
            outcome.elapsed
        ),
        Disposition::Suspect => format!(
            "Status: PROXY WORKING BUT POSSIBLE BAN OR SERVER ERROR ({}) | Speed: {:.2?}",
            outcome.status_code(),
            outcome.elapsed
        ),
        Disposition::Failed => format!("Status: BAD ({}) | Speed: -", outcome.status_code()),
    }
}

fn disposition_color(disposition: Disposition) -> Color {
    match disposition {
        Disposition::Working => Color::Green,
        Disposition::Suspect => Color::Yellow,
        Disposition::Failed => Color::Red,
    }
}

/// Prints each result as it arrives, colored by disposition
pub struct ConsoleSink<W: Write + Send> {
    out: W,
    color: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            color: true,
        }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutcomeSink for ConsoleSink<W> {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition) {
        let line = status_line(outcome, disposition);
        let written = if self.color {
            writeln!(self.out, "Results for {}", outcome.record).and_then(|_| {
                writeln!(self.out, "{}", line.with(disposition_color(disposition)))
            })
        } else {
            writeln!(self.out, "Results for {}", outcome.record)
                .and_then(|_| writeln!(self.out, "{}", line))
        };

        if let Err(e) = written {
            warn!("failed to print result: {}", e);
        }
    }
}

/// Emits one tracing event per classification
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition) {
        debug!(
            proxy = %outcome.record,
            %disposition,
            status = outcome.status_code(),
            elapsed_ms = outcome.elapsed_ms(),
            reason = outcome.failure_reason().unwrap_or(""),
            "proxy classified"
        );
    }
}

/// A classification forwarded to another task
#[derive(Debug, Clone)]
pub struct ClassifiedOutcome {
    pub outcome: ProbeOutcome,
    pub disposition: Disposition,
}

/// Forwards every classification over a channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ClassifiedOutcome>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ClassifiedOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition) {
        // A closed receiver means the viewer went away; the batch carries on.
        let _ = self.tx.send(ClassifiedOutcome {
            outcome: outcome.clone(),
            disposition,
        });
    }
}

/// Reports to two sinks in turn
pub struct Tee<A, B>(pub A, pub B);

impl<A: OutcomeSink, B: OutcomeSink> OutcomeSink for Tee<A, B> {
    fn record(&mut self, outcome: &ProbeOutcome, disposition: Disposition) {
        self.0.record(outcome, disposition);
        self.1.record(outcome, disposition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyRecord;
    use std::time::Duration;

    #[test]
    fn test_status_lines() {
        let record = ProxyRecord::new("1.2.3.4", "8080");

        let ok = ProbeOutcome::completed(record.clone(), Duration::from_millis(400), 200);
        assert_eq!(
            status_line(&ok, Disposition::Working),
            "Status: OK (200) | Speed: 400.00ms"
        );

        let banned = ProbeOutcome::completed(record.clone(), Duration::from_millis(400), 403);
        assert!(status_line(&banned, Disposition::Suspect).contains("POSSIBLE BAN"));

        let failed = ProbeOutcome::transport_failed(record, Duration::from_secs(10), "timeout");
        assert_eq!(
            status_line(&failed, Disposition::Failed),
            "Status: BAD (-1) | Speed: -"
        );
    }

    #[test]
    fn test_console_sink_plain_output() {
        let record = ProxyRecord::with_auth("5.6.7.8", "8080", "alice", "secret");
        let outcome = ProbeOutcome::completed(record, Duration::from_millis(400), 200);

        let mut sink = ConsoleSink::new(Vec::new(), false);
        sink.record(&outcome, Disposition::Working);

        let printed = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            printed,
            "Results for 5.6.7.8:8080:alice:secret\nStatus: OK (200) | Speed: 400.00ms\n"
        );
    }

    #[tokio::test]
    async fn test_channel_sink_and_tee() {
        let (channel, mut rx) = ChannelSink::new();
        let mut sink = Tee(channel, TracingSink);

        let outcome = ProbeOutcome::transport_failed(
            ProxyRecord::new("1.2.3.4", "8080"),
            Duration::from_secs(10),
            "timeout",
        );
        sink.record(&outcome, Disposition::Failed);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.disposition, Disposition::Failed);
        assert_eq!(event.outcome, outcome);
    }
}
