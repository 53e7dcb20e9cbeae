//! Waiting for a user to acknowledge an alert.
//!
//! A wait races four things: an `Acknowledged` event on the bus for the
//! (alert, user) pair, a fixed-interval store poll, the run's cancel token
//! and the response deadline. The poll covers acknowledgments written by
//! another process and doubles as the alert-status checkpoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

use pagerline_core::{AlertId, EventBus};

use crate::runs::CancelToken;
use crate::store::EscalationStore;
use crate::Result;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Acknowledged,
    TimedOut,
    /// The run was cancelled or the alert was resolved
    Cancelled,
}

pub struct AckWaiter {
    store: Arc<dyn EscalationStore>,
    bus: EventBus,
    poll_interval: Duration,
}

impl AckWaiter {
    pub fn new(store: Arc<dyn EscalationStore>, bus: EventBus, poll_interval: Duration) -> Self {
        Self {
            store,
            bus,
            poll_interval,
        }
    }

    /// Whether the most recent notification for the pair has a response.
    pub fn is_acknowledged(&self, alert_id: &AlertId, user_id: &str) -> Result<bool> {
        Ok(self
            .store
            .latest_notification(alert_id, user_id)?
            .is_some_and(|n| n.is_acknowledged()))
    }

    /// Wait up to `timeout` for `user_id` to acknowledge `alert_id`.
    pub async fn wait(
        &self,
        alert_id: AlertId,
        user_id: &str,
        timeout: Duration,
        cancel: &mut CancelToken,
    ) -> WaitOutcome {
        self.race(alert_id, user_id, timeout, cancel, true).await
    }

    /// Sit out `timeout` after an attempt that left no notification row.
    ///
    /// Only cancellation and resolution end the wait early; responses to
    /// older rows for the pair are not counted.
    pub async fn hold(
        &self,
        alert_id: AlertId,
        user_id: &str,
        timeout: Duration,
        cancel: &mut CancelToken,
    ) -> WaitOutcome {
        self.race(alert_id, user_id, timeout, cancel, false).await
    }

    async fn race(
        &self,
        alert_id: AlertId,
        user_id: &str,
        timeout: Duration,
        cancel: &mut CancelToken,
        accept_acks: bool,
    ) -> WaitOutcome {
        // Subscribe before the first check so an acknowledgment written in
        // between is still seen.
        let mut acks = self.bus.filter().acknowledgments_for(alert_id, user_id);
        let deadline = Instant::now() + timeout;

        if cancel.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        if let Some(outcome) = self.poll(&alert_id, user_id, accept_acks) {
            return outcome;
        }

        let expired = sleep_until(deadline);
        tokio::pin!(expired);
        let mut ticks = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut bus_open = accept_acks;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::debug!(%alert_id, user_id, "Wait cancelled");
                    return WaitOutcome::Cancelled;
                }
                event = acks.recv(), if bus_open => match event {
                    Some(_) => {
                        tracing::debug!(%alert_id, user_id, "Acknowledgment signalled");
                        return WaitOutcome::Acknowledged;
                    }
                    None => bus_open = false,
                },
                _ = ticks.tick() => {
                    if let Some(outcome) = self.poll(&alert_id, user_id, accept_acks) {
                        return outcome;
                    }
                }
                _ = &mut expired => return WaitOutcome::TimedOut,
            }
        }
    }

    /// One store check. A failed read counts as "not yet".
    fn poll(&self, alert_id: &AlertId, user_id: &str, accept_acks: bool) -> Option<WaitOutcome> {
        if accept_acks {
            match self.is_acknowledged(alert_id, user_id) {
                Ok(true) => return Some(WaitOutcome::Acknowledged),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(%alert_id, user_id, error = %e, "Acknowledgment poll failed");
                }
            }
        }

        match self.store.alert(alert_id) {
            Ok(Some(alert)) if !alert.is_active() => {
                tracing::debug!(%alert_id, "Alert resolved during wait");
                Some(WaitOutcome::Cancelled)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(%alert_id, error = %e, "Alert status poll failed");
                None
            }
        }
    }
}
