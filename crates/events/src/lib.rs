#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Transfer lifecycle events
//!
//! Components report what happened to a transfer by sending
//! [`TransferEvent`]s over an unbounded channel. Each event travels with an
//! [`EventMeta`] carrying its id, timestamp, level and source.

pub mod meta;
pub mod transfer;

pub use meta::{EventLevel, EventMeta, EventSource};
pub use transfer::{FailureContext, TransferEvent};

use tokio::sync::mpsc::UnboundedSender;

/// An event together with its metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: TransferEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: TransferEvent) -> Self {
        Self { meta, event }
    }

    /// Wrap an event with metadata derived from the event itself
    #[must_use]
    pub fn from_event(event: TransferEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source())
            .with_correlation_id(event.transfer_id().as_str());
        Self::new(meta, event)
    }
}

pub type EventSender = UnboundedSender<EventMessage>;

pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Single API for emitting events, whether from a raw sender or from a
/// struct that may hold one
pub trait EventEmitter {
    fn event_sender(&self) -> Option<&EventSender>;

    fn emit(&self, event: TransferEvent) {
        if let Some(sender) = self.event_sender() {
            // Receiver may be gone; progress tracking carries on regardless
            let _ = sender.send(EventMessage::from_event(event));
        }
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}
