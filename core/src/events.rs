//! Human-readable operational messages for front-ends.
//!
//! Every published event is also logged through `tracing`, so a front-end
//! that never subscribes loses nothing but the structured copy.

use std::fmt;

use lanwake_common::device::DeviceStatus;
use pnet::util::MacAddr;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::coordinator::RoundSummary;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    WakeSent { name: String, mac: MacAddr },
    WakeFailed { name: String, reason: String },
    StatusChanged { name: String, from: DeviceStatus, to: DeviceStatus },
    RoundFinished(RoundSummary),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::WakeSent { name, mac } => {
                write!(f, "magic packet transmitted to {name} ({mac})")
            }
            Event::WakeFailed { name, reason } => {
                write!(f, "error transmitting to {name}: {reason}")
            }
            Event::StatusChanged { name, from, to } => {
                write!(f, "{name} changed from {from} to {to}")
            }
            Event::RoundFinished(summary) => write!(f, "{summary}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventFeed {
    tx: broadcast::Sender<Event>,
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: Event) {
        match &event {
            Event::WakeFailed { .. } => warn!("{event}"),
            Event::RoundFinished(_) => tracing::debug!("{event}"),
            _ => info!("{event}"),
        }
        // No receivers is not an error.
        let _ = self.tx.send(event);
    }
}
