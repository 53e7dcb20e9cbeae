//! The escalation engine.
//!
//! One run walks an alert's chain level by level, SMS then voice at each
//! level, and waits for the notified user to respond after every attempt.
//! The position is saved before each attempt so a run interrupted by a
//! restart can be resumed with [`EscalationEngine::resume`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use pagerline_core::config::{
    DEFAULT_MESSAGE_TEMPLATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_SECS,
};
use pagerline_core::{
    Alert, AlertEvent, AlertId, AlertNotification, ChainLink, ChannelKind, EscalationPosition,
    EventBus, RunState, UserId,
};
use pagerline_notify::NotificationChannel;

use crate::ack::{AckWaiter, WaitOutcome};
use crate::resolver::ChainResolver;
use crate::runs::CancelToken;
use crate::store::EscalationStore;

/// Escalation timing and message settings.
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// How long to wait for a response after each attempt
    pub response_timeout: Duration,
    /// Interval between acknowledgment store polls
    pub poll_interval: Duration,
    /// Message body; `{service}`, `{alert}` and `{level}` are substituted
    pub message_template: String,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

impl EscalationConfig {
    pub fn render_message(&self, alert: &Alert, level: u32) -> String {
        self.message_template
            .replace("{service}", &alert.service_id)
            .replace("{alert}", &alert.id.to_string())
            .replace("{level}", &level.to_string())
    }
}

/// How an escalation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    Acknowledged {
        level: u32,
        channel: ChannelKind,
        user_id: UserId,
    },
    /// Every level and channel was tried without a response
    Exhausted,
    Cancelled,
    NoChain,
    Failed(String),
}

impl EscalationOutcome {
    pub fn state(&self) -> RunState {
        match self {
            Self::Acknowledged { .. } => RunState::Acknowledged,
            Self::Exhausted => RunState::Exhausted,
            Self::Cancelled => RunState::Cancelled,
            Self::NoChain => RunState::NoChain,
            Self::Failed(_) => RunState::Failed,
        }
    }
}

/// Result of one escalation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationReport {
    pub alert_id: AlertId,
    pub outcome: EscalationOutcome,
    /// Attempts issued over the alert's lifetime, including resumed runs
    pub attempts: u32,
}

pub struct EscalationEngine {
    store: Arc<dyn EscalationStore>,
    resolver: Arc<dyn ChainResolver>,
    channel: Arc<dyn NotificationChannel>,
    bus: EventBus,
    waiter: AckWaiter,
    config: EscalationConfig,
}

impl EscalationEngine {
    pub fn new(
        store: Arc<dyn EscalationStore>,
        resolver: Arc<dyn ChainResolver>,
        channel: Arc<dyn NotificationChannel>,
        bus: EventBus,
        config: EscalationConfig,
    ) -> Self {
        let waiter = AckWaiter::new(store.clone(), bus.clone(), config.poll_interval);
        Self {
            store,
            resolver,
            channel,
            bus,
            waiter,
            config,
        }
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    /// Escalate a freshly created alert from the first level.
    pub async fn run(&self, alert: &Alert, cancel: CancelToken) -> EscalationReport {
        self.drive(alert, EscalationPosition::start(alert.id), cancel).await
    }

    /// Continue an interrupted run.
    ///
    /// Attempts before the saved level and channel are skipped. If the saved
    /// attempt was already answered the run finishes as acknowledged;
    /// otherwise it is issued again, since it may not have gone out.
    pub async fn resume(
        &self,
        alert: &Alert,
        position: EscalationPosition,
        cancel: CancelToken,
    ) -> EscalationReport {
        self.drive(alert, position, cancel).await
    }

    async fn drive(
        &self,
        alert: &Alert,
        mut position: EscalationPosition,
        mut cancel: CancelToken,
    ) -> EscalationReport {
        let alert_id = alert.id;
        let resume_from = (position.attempts > 0)
            .then(|| (position.level, sequence_index(position.channel)));
        tracing::info!(
            %alert_id,
            service_id = %alert.service_id,
            resumed = resume_from.is_some(),
            "Starting escalation"
        );

        let chain = match self.resolver.resolve(&alert.service_id).await {
            Ok(chain) => chain,
            Err(e) => {
                tracing::error!(%alert_id, error = %e, "Failed to load escalation chain");
                return self.finish(&mut position, EscalationOutcome::Failed(e.to_string()));
            }
        };
        if chain.is_empty() {
            tracing::warn!(%alert_id, service_id = %alert.service_id, "No escalation chain configured");
            return self.finish(&mut position, EscalationOutcome::NoChain);
        }

        if let Some(report) = self.acknowledged_before_resume(&chain, &mut position) {
            return report;
        }

        for link in &chain {
            let message = self.config.render_message(alert, link.level);
            for (idx, channel) in ChannelKind::ESCALATION_SEQUENCE.iter().copied().enumerate() {
                if resume_from.is_some_and(|from| (link.level, idx) < from) {
                    continue;
                }
                if self.should_stop(&alert_id, &cancel) {
                    tracing::info!(%alert_id, "Escalation cancelled");
                    return self.finish(&mut position, EscalationOutcome::Cancelled);
                }

                position.advance(link.level, channel);
                self.save(&position);
                let recorded = self.attempt(alert, link, channel, &message).await;

                let timeout = self.config.response_timeout;
                let outcome = if recorded {
                    self.waiter.wait(alert_id, &link.user.id, timeout, &mut cancel).await
                } else {
                    self.waiter.hold(alert_id, &link.user.id, timeout, &mut cancel).await
                };
                match outcome {
                    WaitOutcome::Acknowledged => {
                        tracing::info!(
                            %alert_id,
                            user_id = %link.user.id,
                            level = link.level,
                            %channel,
                            "Alert acknowledged"
                        );
                        return self.finish(
                            &mut position,
                            EscalationOutcome::Acknowledged {
                                level: link.level,
                                channel,
                                user_id: link.user.id.clone(),
                            },
                        );
                    }
                    WaitOutcome::Cancelled => {
                        tracing::info!(%alert_id, "Escalation cancelled");
                        return self.finish(&mut position, EscalationOutcome::Cancelled);
                    }
                    WaitOutcome::TimedOut => {
                        tracing::debug!(
                            %alert_id,
                            user_id = %link.user.id,
                            level = link.level,
                            %channel,
                            "No response before timeout"
                        );
                    }
                }
            }
        }

        tracing::warn!(%alert_id, attempts = position.attempts, "Escalation chain exhausted without acknowledgment");
        self.finish(&mut position, EscalationOutcome::Exhausted)
    }

    /// A response to the saved attempt that arrived while no run was live.
    ///
    /// Only counts when the user's newest row is for the saved channel, so a
    /// row left by an earlier level is never taken for this one.
    fn acknowledged_before_resume(
        &self,
        chain: &[ChainLink],
        position: &mut EscalationPosition,
    ) -> Option<EscalationReport> {
        if position.attempts == 0 {
            return None;
        }
        let alert_id = position.alert_id;
        let link = chain.iter().find(|link| link.level == position.level)?;
        let latest = match self.store.latest_notification(&alert_id, &link.user.id) {
            Ok(latest) => latest?,
            Err(e) => {
                tracing::warn!(%alert_id, user_id = %link.user.id, error = %e, "Acknowledgment check failed");
                return None;
            }
        };
        if latest.channel != position.channel || !latest.is_acknowledged() {
            return None;
        }

        let channel = position.channel;
        tracing::info!(
            %alert_id,
            user_id = %link.user.id,
            level = link.level,
            %channel,
            "Alert acknowledged while escalation was interrupted"
        );
        Some(self.finish(
            position,
            EscalationOutcome::Acknowledged {
                level: link.level,
                channel,
                user_id: link.user.id.clone(),
            },
        ))
    }

    /// Record and send one attempt. Failures never abort the run.
    ///
    /// Returns whether the notification row was written.
    async fn attempt(&self, alert: &Alert, link: &ChainLink, channel: ChannelKind, message: &str) -> bool {
        let alert_id = alert.id;
        let user_id = &link.user.id;
        let notification = AlertNotification::new(alert_id, user_id.clone(), channel);
        if let Err(e) = self.store.record_notification(&notification) {
            tracing::error!(
                %alert_id,
                %user_id,
                level = link.level,
                %channel,
                error = %e,
                "Failed to record notification, skipping send"
            );
            return false;
        }

        match self.channel.send(channel, &link.user.phone, message).await {
            Ok(()) => {
                tracing::info!(%alert_id, %user_id, level = link.level, %channel, "Notification sent");
                self.bus.publish(AlertEvent::NotificationSent {
                    alert_id,
                    user_id: user_id.clone(),
                    level: link.level,
                    channel,
                    timestamp: Utc::now().timestamp(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    %alert_id,
                    %user_id,
                    level = link.level,
                    %channel,
                    error = %e,
                    "Notification send failed, waiting anyway"
                );
                self.bus.publish(AlertEvent::NotificationFailed {
                    alert_id,
                    user_id: user_id.clone(),
                    level: link.level,
                    channel,
                    error: e.to_string(),
                    timestamp: Utc::now().timestamp(),
                });
            }
        }
        true
    }

    /// Cancellation checkpoint between attempts.
    fn should_stop(&self, alert_id: &AlertId, cancel: &CancelToken) -> bool {
        if cancel.is_cancelled() {
            return true;
        }
        match self.store.alert(alert_id) {
            Ok(Some(alert)) => !alert.is_active(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(%alert_id, error = %e, "Could not read alert status");
                false
            }
        }
    }

    fn save(&self, position: &EscalationPosition) {
        if let Err(e) = self.store.save_position(position) {
            tracing::error!(alert_id = %position.alert_id, error = %e, "Failed to save escalation position");
        }
    }

    fn finish(&self, position: &mut EscalationPosition, outcome: EscalationOutcome) -> EscalationReport {
        position.finish(outcome.state());
        self.save(position);
        self.bus.publish(AlertEvent::EscalationFinished {
            alert_id: position.alert_id,
            state: position.state,
            attempts: position.attempts,
            timestamp: Utc::now().timestamp(),
        });
        EscalationReport {
            alert_id: position.alert_id,
            outcome,
            attempts: position.attempts,
        }
    }
}

fn sequence_index(channel: ChannelKind) -> usize {
    ChannelKind::ESCALATION_SEQUENCE
        .iter()
        .position(|c| *c == channel)
        .unwrap_or(0)
}
