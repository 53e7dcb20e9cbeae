//! Pagerline web API.
//!
//! REST endpoints for the on-call directory, alerts and acknowledgments,
//! plus the configuration loader and the server wiring used by the
//! `pagerline` binary.

pub mod config;
pub mod handlers;
pub mod models;
pub mod server;
pub mod shutdown;

pub use config::AppConfig;
pub use server::{create_router, run, ServerState};
