//! Core types for Pagerline.
//!
//! This crate defines the domain model shared by every other crate in the
//! workspace: alerts, notification attempts, the on-call directory, the
//! persisted escalation position, and the event bus used to signal state
//! changes between components.

pub mod alert;
pub mod config;
pub mod directory;
pub mod error;
pub mod escalation;
pub mod event;
pub mod eventbus;
pub mod notification;

pub use alert::{Alert, AlertId, AlertStatus, ServiceId, VerificationStatus};
pub use directory::{ChainLink, EscalationChainEntry, HealthCheck, HealthState, Service, User, UserId};
pub use error::{Error, Result};
pub use escalation::{EscalationPosition, RunState};
pub use event::{AlertEvent, EventMetadata};
pub use eventbus::{EventBus, EventBusReceiver, FilterBuilder, FilteredReceiver, SharedEventBus};
pub use notification::{AlertNotification, ChannelKind, NotificationId, NotificationStatus};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
