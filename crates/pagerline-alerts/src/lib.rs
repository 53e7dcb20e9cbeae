//! Alert escalation for Pagerline.
//!
//! - [`EscalationEngine`]: walks a service's chain, SMS then voice per level
//! - [`AckWaiter`]: waits for a user's acknowledgment, event-first with a
//!   store poll as fallback
//! - [`RunRegistry`]: one supervised, cancellable task per alert
//! - [`AlertManager`]: create, resolve, verify, acknowledge and recover
//! - [`HealthMonitor`]: probes services and opens alerts for failures

pub mod ack;
pub mod engine;
pub mod error;
pub mod health;
pub mod manager;
pub mod resolver;
pub mod runs;
pub mod store;

pub use ack::{AckWaiter, WaitOutcome};
pub use engine::{EscalationConfig, EscalationEngine, EscalationOutcome, EscalationReport};
pub use error::{Error, Result};
pub use health::{HealthMonitor, HealthProbe, HttpProbe, MonitorHandle};
pub use manager::AlertManager;
pub use resolver::{ChainResolver, DirectoryChainResolver};
pub use runs::{cancel_pair, CancelHandle, CancelToken, RunRegistry};
pub use store::EscalationStore;
