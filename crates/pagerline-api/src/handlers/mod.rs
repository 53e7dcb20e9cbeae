//! API request handlers.

pub mod alerts;
pub mod basic;
pub mod channels;
pub mod common;
pub mod escalation;
pub mod services;
pub mod users;

pub use crate::server::ServerState;
