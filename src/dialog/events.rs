//! Lifecycle events published by the dialog controller

use super::{
    surface::SurfaceHandle,
    types::{DialogKind, DialogPhase},
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// The four lifecycle notifications a controller emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Opening,
    Opened,
    Closing,
    Closed,
}

impl LifecycleEvent {
    pub fn phase(self) -> DialogPhase {
        match self {
            LifecycleEvent::Opening => DialogPhase::Opening,
            LifecycleEvent::Opened => DialogPhase::Opened,
            LifecycleEvent::Closing => DialogPhase::Closing,
            LifecycleEvent::Closed => DialogPhase::Closed,
        }
    }
}

impl From<DialogPhase> for LifecycleEvent {
    fn from(phase: DialogPhase) -> Self {
        match phase {
            DialogPhase::Opening => LifecycleEvent::Opening,
            DialogPhase::Opened => LifecycleEvent::Opened,
            DialogPhase::Closing => LifecycleEvent::Closing,
            DialogPhase::Closed => LifecycleEvent::Closed,
        }
    }
}

/// Payload of every lifecycle event
#[derive(Debug, Clone)]
pub struct DialogEvent {
    pub kind: LifecycleEvent,
    pub id: DialogKind,
    pub surface: SurfaceHandle,
    /// Surface return value; only set for `Closing` and `Closed`
    pub return_value: Option<String>,
    pub at: DateTime<Utc>,
}

impl DialogEvent {
    pub fn new(kind: LifecycleEvent, id: DialogKind, surface: SurfaceHandle) -> Self {
        let return_value = match kind {
            LifecycleEvent::Closing | LifecycleEvent::Closed => surface.return_value(),
            LifecycleEvent::Opening | LifecycleEvent::Opened => None,
        };
        Self {
            kind,
            id,
            surface,
            return_value,
            at: Utc::now(),
        }
    }
}

/// Typed publish/subscribe channel for lifecycle events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DialogEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DialogEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; having no subscribers is fine
    pub fn publish(&self, event: DialogEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
