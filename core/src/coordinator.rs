//! # Probe Round Coordinator
//!
//! Runs exactly one probing round over every registered device.
//!
//! Probes are spawned onto a [`JoinSet`], at most `max_concurrency` of them
//! talking to the network at once, and are merged into the [`Registry`] in
//! completion order. A probe that panics, overruns the optional round deadline,
//! or is cut off by cancellation never touches its device's row; every other
//! device is still merged normally.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lanwake_common::config::MonitorSettings;
use lanwake_common::device::{DeviceId, DeviceStatus};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventFeed};
use crate::prober::{ProbeOutcome, Prober};
use crate::registry::{Registry, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSettings {
    pub probe_timeout: Duration,
    /// Probes allowed in flight at once. Zero is treated as one.
    pub max_concurrency: usize,
    pub round_deadline: Option<Duration>,
}

impl From<&MonitorSettings> for RoundSettings {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            probe_timeout: settings.probe_timeout(),
            max_concurrency: settings.max_concurrency,
            round_deadline: settings.round_deadline(),
        }
    }
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self::from(&MonitorSettings::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub online: usize,
    pub offline: usize,
    pub errored: usize,
    /// Probes that never merged: panicked, past the deadline, cancelled or stale.
    pub abandoned: usize,
    pub elapsed: Duration,
}

impl RoundSummary {
    pub fn merged(&self) -> usize {
        self.online + self.offline + self.errored
    }

    fn record(&mut self, status: DeviceStatus) {
        match status {
            DeviceStatus::Online => self.online += 1,
            DeviceStatus::Offline => self.offline += 1,
            DeviceStatus::Error => self.errored += 1,
            DeviceStatus::Unknown => {}
        }
    }
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round finished in {:.2}s: {} online, {} offline, {} errored",
            self.elapsed.as_secs_f64(),
            self.online,
            self.offline,
            self.errored
        )?;
        if self.abandoned > 0 {
            write!(f, ", {} abandoned", self.abandoned)?;
        }
        Ok(())
    }
}

enum FanIn {
    Drained,
    DeadlineElapsed,
    Cancelled,
}

pub struct Coordinator {
    registry: Arc<Registry>,
    prober: Arc<dyn Prober>,
    events: EventFeed,
    settings: RoundSettings,
}

impl Coordinator {
    pub fn new(
        registry: Arc<Registry>,
        prober: Arc<dyn Prober>,
        events: EventFeed,
        settings: RoundSettings,
    ) -> Self {
        Self {
            registry,
            prober,
            events,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Probes every device once and merges each result as it arrives.
    ///
    /// Returns once every probe has merged, the round deadline has passed, or
    /// `cancel` fires. Unfinished probes are aborted before returning.
    pub async fn run_round(&self, cancel: &CancellationToken) -> RoundSummary {
        let started: Instant = Instant::now();
        let mut summary: RoundSummary = RoundSummary::default();

        let targets: Vec<(DeviceId, String)> = self.registry.targets();
        if targets.is_empty() {
            debug!("no devices configured, skipping round");
            summary.elapsed = started.elapsed();
            return summary;
        }

        let limit: Arc<Semaphore> = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let mut tasks: JoinSet<ProbeOutcome> = JoinSet::new();
        let mut pending: HashMap<task::Id, DeviceId> = HashMap::with_capacity(targets.len());

        for (id, address) in targets {
            let prober: Arc<dyn Prober> = Arc::clone(&self.prober);
            let limit: Arc<Semaphore> = Arc::clone(&limit);
            let probe_timeout: Duration = self.settings.probe_timeout;

            let handle = tasks.spawn(async move {
                let _permit = limit.acquire_owned().await.ok();
                prober.probe(&address, probe_timeout).await
            });
            pending.insert(handle.id(), id);
        }

        // A deadline too far out to represent is no deadline at all.
        let deadline_at: Option<Instant> =
            self.settings.round_deadline.and_then(|d| started.checked_add(d));
        let deadline = deadline_elapsed(deadline_at);
        tokio::pin!(deadline);

        let end: FanIn = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break FanIn::Cancelled,
                _ = &mut deadline => break FanIn::DeadlineElapsed,
                next = tasks.join_next_with_id() => next,
            };

            match next {
                None => break FanIn::Drained,
                Some(Ok((task_id, outcome))) => {
                    if let Some(id) = pending.remove(&task_id) {
                        self.merge(id, outcome, &mut summary);
                    }
                }
                Some(Err(e)) => {
                    let device: Option<DeviceId> = pending.remove(&e.id());
                    let name: String = self.display_name(device);
                    error!(device = %name, error = %e, "probe task failed, keeping previous status");
                    summary.abandoned += 1;
                }
            }
        };

        if !pending.is_empty() {
            match end {
                FanIn::Cancelled => info!(outstanding = pending.len(), "round cancelled"),
                FanIn::DeadlineElapsed => warn!(
                    outstanding = pending.len(),
                    "round deadline elapsed, abandoning remaining probes"
                ),
                FanIn::Drained => {}
            }
            summary.abandoned += pending.len();
            tasks.shutdown().await;
        }

        summary.elapsed = started.elapsed();
        self.events.publish(Event::RoundFinished(summary));
        summary
    }

    fn merge(&self, id: DeviceId, outcome: ProbeOutcome, summary: &mut RoundSummary) {
        let name: String = self.display_name(Some(id));
        let status: DeviceStatus = outcome.status();
        if let ProbeOutcome::ProbeFailed(reason) = &outcome {
            warn!(device = %name, %reason, "probe failed");
        }

        match self.registry.update_status(id, status, Utc::now()) {
            Ok(Some(previous)) => {
                summary.record(status);
                if previous != status {
                    self.events.publish(Event::StatusChanged {
                        name,
                        from: previous,
                        to: status,
                    });
                }
            }
            Ok(None) => {
                debug!(device = %name, "discarded result older than the stored one");
                summary.abandoned += 1;
            }
            Err(e) => {
                error!(error = %e, "failed to merge probe result");
                summary.abandoned += 1;
            }
        }
    }

    /// Probes one device and merges its result without touching any other
    /// row. Returns the merged status, or `None` when nothing was merged.
    pub async fn check_device(&self, id: DeviceId) -> Result<Option<DeviceStatus>, RegistryError> {
        let row = self.registry.get(id).ok_or(RegistryError::UnknownDevice(id))?;
        let prober: Arc<dyn Prober> = Arc::clone(&self.prober);
        let probe_timeout: Duration = self.settings.probe_timeout;
        let address: String = row.device.address;

        let outcome: ProbeOutcome =
            match tokio::spawn(async move { prober.probe(&address, probe_timeout).await }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(device = %row.device.name, error = %e, "probe task failed, keeping previous status");
                    return Ok(None);
                }
            };

        let mut summary: RoundSummary = RoundSummary::default();
        self.merge(id, outcome, &mut summary);
        if summary.merged() == 0 {
            return Ok(None);
        }
        Ok(self.registry.get(id).map(|row| row.status))
    }

    fn display_name(&self, id: Option<DeviceId>) -> String {
        id.and_then(|id| self.registry.get(id))
            .map(|row| row.device.name)
            .unwrap_or_else(|| String::from("<unknown>"))
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
