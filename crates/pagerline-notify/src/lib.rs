//! Notification channels for Pagerline.
//!
//! ## Features
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `webhook` | ✅ | JSON webhook channel |
//! | `twilio` | ✅ | Twilio SMS and voice channel |
//!
//! The escalation engine depends on a single [`NotificationChannel`]; in
//! practice that is a [`ChannelRegistry`] that routes each
//! [`pagerline_core::ChannelKind`] to a concrete provider.

pub mod channels;
pub mod error;

pub use channels::{
    build_channel, factory_for, ChannelFactory, ChannelInfo, ChannelRegistry, ConsoleChannel,
    ConsoleChannelFactory, Delivery, MemoryChannel, MemoryChannelFactory, NotificationChannel,
};
pub use error::{Error, Result};

#[cfg(feature = "webhook")]
pub use channels::{WebhookChannel, WebhookChannelFactory};

#[cfg(feature = "twilio")]
pub use channels::{TwilioChannel, TwilioChannelFactory, TwilioConfig};
