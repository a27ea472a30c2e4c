//! TUI module for watching a check as it runs

mod proxy_checker;

pub use proxy_checker::ProxyCheckerApp;

use crate::proxy::CheckSummary;
use crate::Result;
use anyhow::Context;
use std::future::Future;
use tokio::task::JoinHandle;

/// Drive `view` to completion, then wait for the batch it was watching.
///
/// The batch result is returned even when the view fails, so the caller can
/// still save what was checked.
pub async fn run_alongside<V>(
    batch: JoinHandle<Result<CheckSummary>>,
    view: V,
) -> (Result<CheckSummary>, Result<()>)
where
    V: Future<Output = Result<()>>,
{
    let view_result = view.await;
    let summary = batch
        .await
        .context("check task panicked")
        .and_then(|result| result);
    (summary, view_result)
}
