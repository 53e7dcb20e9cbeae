//! Persisted escalation progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertId;
use crate::notification::ChannelKind;

/// State of an escalation run for one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Attempts are still being made
    Running,
    /// A user responded
    Acknowledged,
    /// Every level and channel was tried without a response
    Exhausted,
    /// The alert was resolved or the run was stopped
    Cancelled,
    /// The service has no escalation chain
    NoChain,
    /// The chain could not be loaded
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Acknowledged => "acknowledged",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::NoChain => "no_chain",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an alert's escalation currently stands.
///
/// Saved before every attempt so an interrupted run can pick up at the
/// same level and channel after a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPosition {
    pub alert_id: AlertId,
    /// Chain level of the current (or last) attempt; zero before the first
    pub level: u32,
    pub channel: ChannelKind,
    /// Attempts issued so far
    pub attempts: u32,
    pub state: RunState,
    pub updated_at: DateTime<Utc>,
}

impl EscalationPosition {
    pub fn start(alert_id: AlertId) -> Self {
        Self {
            alert_id,
            level: 0,
            channel: ChannelKind::Sms,
            attempts: 0,
            state: RunState::Running,
            updated_at: Utc::now(),
        }
    }

    /// Move to an attempt at `level` over `channel`.
    pub fn advance(&mut self, level: u32, channel: ChannelKind) {
        self.level = level;
        self.channel = channel;
        self.attempts += 1;
        self.updated_at = Utc::now();
    }

    pub fn finish(&mut self, state: RunState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
