//! Fan-out of probes: one task per proxy, all feeding one channel

use crate::proxy::models::{ProbeOutcome, ProxyRecord};
use crate::proxy::prober::Prober;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

/// Spawn one probe task per record and return the completion channel along
/// with the number of outcomes it will carry.
///
/// Outcomes arrive in the order the probes finish. With `concurrency` set to
/// `None` every probe starts immediately; `Some(n)` keeps at most `n` in flight.
pub fn dispatch<P>(
    prober: Arc<P>,
    records: Vec<ProxyRecord>,
    concurrency: Option<usize>,
) -> (mpsc::UnboundedReceiver<ProbeOutcome>, usize)
where
    P: Prober + ?Sized + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let expected = dispatch_into(prober, records, concurrency, tx);
    (rx, expected)
}

/// Like [`dispatch`], but sends into a channel the caller already owns.
///
/// Returns the number of outcomes that will be sent.
pub fn dispatch_into<P>(
    prober: Arc<P>,
    records: Vec<ProxyRecord>,
    concurrency: Option<usize>,
    tx: mpsc::UnboundedSender<ProbeOutcome>,
) -> usize
where
    P: Prober + ?Sized + 'static,
{
    let expected = records.len();
    let semaphore = concurrency.map(|limit| Arc::new(Semaphore::new(limit.max(1))));

    for record in records {
        let prober = Arc::clone(&prober);
        let semaphore = semaphore.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = match semaphore {
                Some(sem) => sem.acquire_owned().await.ok(),
                None => None,
            };

            let outcome = match prober.probe(&record).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(proxy = %record, "probe could not be built: {}", e);
                    ProbeOutcome::transport_failed(record, Duration::ZERO, e.to_string())
                }
            };

            // The aggregator closes the receiver only after taking every
            // expected outcome, so a send error cannot lose anything.
            let _ = tx.send(outcome);
        });
    }

    expected
}
