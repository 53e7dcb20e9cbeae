//! Supervision of escalation runs.
//!
//! One task per alert, keyed by [`AlertId`]. Each run gets a
//! [`CancelToken`] so resolving an alert can stop its run directly
//! instead of waiting for the next store poll.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

use pagerline_core::AlertId;

use crate::engine::EscalationReport;

/// Sender side of a run's cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

/// Receiver side, polled by the run at every checkpoint.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        cancel_pair().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

struct RunEntry {
    cancel: CancelHandle,
    done: watch::Receiver<Option<EscalationReport>>,
}

/// Live escalation runs.
#[derive(Clone, Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<AlertId, RunEntry>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `run` for `alert_id` on its own task.
    ///
    /// Returns `false` without starting anything when a run for the alert
    /// is already live. The entry is removed when the run returns.
    pub fn spawn<F, Fut>(&self, alert_id: AlertId, run: F) -> bool
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = EscalationReport> + Send + 'static,
    {
        let (cancel, token) = cancel_pair();
        let (done_tx, done_rx) = watch::channel(None);

        match self.runs.entry(alert_id) {
            Entry::Occupied(_) => {
                tracing::debug!(%alert_id, "Escalation already running, not starting another");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(RunEntry {
                    cancel,
                    done: done_rx,
                });
            }
        }

        let fut = run(token);
        let runs = self.runs.clone();
        tokio::spawn(async move {
            let report = fut.await;
            runs.remove(&alert_id);
            done_tx.send_replace(Some(report));
        });
        true
    }

    /// Ask a live run to stop. Returns `false` if none is running.
    pub fn cancel(&self, alert_id: &AlertId) -> bool {
        match self.runs.get(alert_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, alert_id: &AlertId) -> bool {
        self.runs.contains_key(alert_id)
    }

    pub fn active_count(&self) -> usize {
        self.runs.len()
    }

    /// Wait for a live run to finish and return its report.
    ///
    /// Returns `None` if no run is live for the alert or the run's task
    /// ended without producing a report.
    pub async fn join(&self, alert_id: &AlertId) -> Option<EscalationReport> {
        let mut done = self.runs.get(alert_id)?.done.clone();
        let report = done.wait_for(|report| report.is_some()).await.ok()?;
        report.clone()
    }
}
