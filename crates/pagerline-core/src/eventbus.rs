//! Broadcast event bus.
//!
//! Publishers never block: a subscriber that falls behind loses the oldest
//! buffered events and keeps receiving newer ones.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::alert::AlertId;
use crate::event::{AlertEvent, EventMetadata};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<(AlertEvent, EventMetadata)>,
    name: String,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` events per slow subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            name: "default".to_string(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            tx: broadcast::channel(DEFAULT_CHANNEL_CAPACITY).0,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event. Returns `true` if at least one subscriber received it.
    pub fn publish(&self, event: AlertEvent) -> bool {
        self.publish_with_source(event, "system")
    }

    pub fn publish_with_source(&self, event: AlertEvent, source: impl Into<String>) -> bool {
        self.tx.send((event, EventMetadata::new(source))).is_ok()
    }

    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Subscribe to events for which `filter` returns `true`.
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&AlertEvent) -> bool + Send + 'static,
    {
        FilteredReceiver::new(self.tx.subscribe(), filter)
    }

    pub fn filter(&self) -> FilterBuilder {
        FilterBuilder {
            tx: self.tx.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver for all events.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<(AlertEvent, EventMetadata)>,
}

impl EventBusReceiver {
    /// Receive the next event, or `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<(AlertEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event bus subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<(AlertEvent, EventMetadata)> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Receiver that only yields events matching a predicate.
pub struct FilteredReceiver<F>
where
    F: Fn(&AlertEvent) -> bool + Send,
{
    rx: broadcast::Receiver<(AlertEvent, EventMetadata)>,
    filter: F,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&AlertEvent) -> bool + Send,
{
    fn new(rx: broadcast::Receiver<(AlertEvent, EventMetadata)>, filter: F) -> Self {
        Self { rx, filter }
    }

    pub async fn recv(&mut self) -> Option<(AlertEvent, EventMetadata)> {
        loop {
            match self.rx.recv().await {
                Ok((event, meta)) => {
                    if (self.filter)(&event) {
                        return Some((event, meta));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<(AlertEvent, EventMetadata)> {
        loop {
            match self.rx.try_recv() {
                Ok((event, meta)) if (self.filter)(&event) => return Some((event, meta)),
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

/// Builder for common filtered subscriptions.
pub struct FilterBuilder {
    tx: broadcast::Sender<(AlertEvent, EventMetadata)>,
}

impl FilterBuilder {
    pub fn lifecycle_events(&self) -> FilteredReceiver<fn(&AlertEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), AlertEvent::is_lifecycle_event)
    }

    pub fn escalation_events(&self) -> FilteredReceiver<fn(&AlertEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), AlertEvent::is_escalation_event)
    }

    pub fn health_events(&self) -> FilteredReceiver<fn(&AlertEvent) -> bool> {
        FilteredReceiver::new(self.tx.subscribe(), AlertEvent::is_health_event)
    }

    /// Events concerning a single alert.
    pub fn for_alert(
        &self,
        alert_id: AlertId,
    ) -> FilteredReceiver<impl Fn(&AlertEvent) -> bool + Send + 'static> {
        FilteredReceiver::new(self.tx.subscribe(), move |event: &AlertEvent| {
            event.alert_id() == Some(alert_id)
        })
    }

    /// Acknowledgments by `user_id` for `alert_id`.
    pub fn acknowledgments_for(
        &self,
        alert_id: AlertId,
        user_id: impl Into<String>,
    ) -> FilteredReceiver<impl Fn(&AlertEvent) -> bool + Send + 'static> {
        let user_id = user_id.into();
        FilteredReceiver::new(self.tx.subscribe(), move |event: &AlertEvent| {
            event.is_acknowledgment_of(&alert_id, &user_id)
        })
    }

    pub fn custom<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&AlertEvent) -> bool + Send + 'static,
    {
        FilteredReceiver::new(self.tx.subscribe(), filter)
    }
}

pub type SharedEventBus = Arc<EventBus>;
