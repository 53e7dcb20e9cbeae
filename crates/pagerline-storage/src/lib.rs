//! Persistent storage for Pagerline.
//!
//! Every store keeps JSON rows in its own redb file under the data
//! directory, or in memory for tests:
//! - [`AlertStore`]: alerts, notification attempts and escalation positions
//! - [`DirectoryStore`]: services, users and escalation chains
//! - [`HealthStore`]: health-check history

pub mod alerts;
mod backend;
pub mod directory;
pub mod error;
pub mod health;

pub use alerts::AlertStore;
pub use directory::DirectoryStore;
pub use error::{Error, Result};
pub use health::HealthStore;
