//! # Monitoring Loop
//!
//! The process's only background driver: run a round, sleep, repeat.
//!
//! Rounds never overlap. The sleep only starts once the previous round has
//! fanned in, so every write to a device happens-after the previous round's
//! write to that same device.

use std::time::Duration;

use lanwake_common::device::{DeviceId, DeviceStatus};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::coordinator::{Coordinator, RoundSummary};
use crate::registry::RegistryError;

pub struct Monitor {
    coordinator: Coordinator,
    interval: Duration,
}

impl Monitor {
    pub fn new(coordinator: Coordinator, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Runs rounds until `cancel` fires. Cancellation is honoured both while
    /// sleeping and in the middle of a round.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            devices = self.coordinator.registry().len(),
            interval_secs = self.interval.as_secs_f64(),
            "Monitoring started"
        );

        while !cancel.is_cancelled() {
            self.coordinator.run_round(&cancel).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("Monitoring stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Probes a single device outside the regular rounds.
    pub async fn check_device(&self, id: DeviceId) -> Result<Option<DeviceStatus>, RegistryError> {
        self.coordinator.check_device(id).await
    }

    /// Runs `rounds` rounds back to back, ignoring the interval.
    pub async fn run_rounds(&self, rounds: usize, cancel: &CancellationToken) -> Vec<RoundSummary> {
        let mut summaries: Vec<RoundSummary> = Vec::with_capacity(rounds);
        for _ in 0..rounds {
            if cancel.is_cancelled() {
                break;
            }
            summaries.push(self.coordinator.run_round(cancel).await);
        }
        summaries
    }
}
