//! # lanwake core
//!
//! Liveness monitoring and Wake-on-LAN for a fixed set of hosts.
//!
//! * [`registry`]: the shared, concurrently readable device table.
//! * [`prober`]: single-host reachability checks.
//! * [`coordinator`]: one concurrent probing round over every device.
//! * [`monitor`]: the background loop that drives rounds on an interval.
//! * [`wake`]: magic packet transmission.
//! * [`events`]: human-readable event stream for front-ends.

use std::sync::Arc;

use lanwake_common::config::{Config, ProbeMethod};

pub mod coordinator;
pub mod events;
pub mod monitor;
pub mod prober;
pub mod registry;
pub mod wake;

use coordinator::{Coordinator, RoundSettings};
use events::EventFeed;
use monitor::Monitor;
use prober::{HandshakeProber, IcmpProber, Prober};
use registry::Registry;
use wake::{PacketTransmitter, WakeService};

/// Everything a front-end needs, wired from one [`Config`].
pub struct Runtime {
    pub registry: Arc<Registry>,
    pub events: EventFeed,
    pub monitor: Monitor,
    pub wake: WakeService,
}

impl Runtime {
    pub fn new(cfg: &Config) -> Self {
        let prober: Arc<dyn Prober> = match cfg.monitor.probe {
            ProbeMethod::Icmp => Arc::new(IcmpProber::new()),
            ProbeMethod::Tcp => Arc::new(HandshakeProber::new(cfg.monitor.tcp_port)),
        };
        Self::with_parts(cfg, prober, PacketTransmitter::broadcast(&cfg.wake))
    }

    /// Same wiring with caller-supplied network edges.
    pub fn with_parts(cfg: &Config, prober: Arc<dyn Prober>, transmitter: PacketTransmitter) -> Self {
        let registry: Arc<Registry> = Arc::new(Registry::new(cfg.devices.clone()));
        let events: EventFeed = EventFeed::new();
        let coordinator = Coordinator::new(
            Arc::clone(&registry),
            prober,
            events.clone(),
            RoundSettings::from(&cfg.monitor),
        );

        Self {
            monitor: Monitor::new(coordinator, cfg.monitor.interval()),
            wake: WakeService::new(Arc::clone(&registry), transmitter, events.clone()),
            registry,
            events,
        }
    }
}
