//! # Device Registry
//!
//! The single synchronization point between the monitoring task and whoever
//! displays results. Device identities are fixed at construction; only the
//! status half of each row changes, one row at a time, under its own lock.
//!
//! Readers either poll [`Registry::list`] or wait on the revision counter
//! returned by [`Registry::subscribe`], which is bumped after every applied merge.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use lanwake_common::device::{Device, DeviceId, DeviceSnapshot, DeviceStatus};
use pnet::util::MacAddr;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no device with id {0}")]
    UnknownDevice(DeviceId),
}

#[derive(Debug, Clone, Copy, Default)]
struct DeviceState {
    status: DeviceStatus,
    last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Entry {
    device: Device,
    state: RwLock<DeviceState>,
}

#[derive(Debug)]
pub struct Registry {
    entries: Vec<Entry>,
    revision: watch::Sender<u64>,
}

impl Registry {
    pub fn new(devices: Vec<Device>) -> Self {
        let entries: Vec<Entry> = devices
            .into_iter()
            .map(|device| Entry {
                device,
                state: RwLock::new(DeviceState::default()),
            })
            .collect();

        Self {
            entries,
            revision: watch::Sender::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered copy of every row. Each row is consistent on its own; rows may
    /// come from different moments of an in-flight round.
    pub fn list(&self) -> Vec<DeviceSnapshot> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| snapshot(DeviceId(idx), entry))
            .collect()
    }

    pub fn get(&self, id: DeviceId) -> Option<DeviceSnapshot> {
        self.entries.get(id.0).map(|entry| snapshot(id, entry))
    }

    /// First device with the given display name.
    pub fn find_by_name(&self, name: &str) -> Option<DeviceId> {
        self.entries
            .iter()
            .position(|entry| entry.device.name == name)
            .map(DeviceId)
    }

    pub fn find_by_hardware_address(&self, mac: MacAddr) -> Option<DeviceId> {
        self.entries
            .iter()
            .position(|entry| entry.device.hardware_address == mac)
            .map(DeviceId)
    }

    /// Probing input: every device id with the address to probe.
    pub fn targets(&self) -> Vec<(DeviceId, String)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (DeviceId(idx), entry.device.address.clone()))
            .collect()
    }

    /// Stores a probe result for one device.
    ///
    /// Returns the previous status when applied, or `None` when `checked_at`
    /// is older than the result already stored.
    pub fn update_status(
        &self,
        id: DeviceId,
        status: DeviceStatus,
        checked_at: DateTime<Utc>,
    ) -> Result<Option<DeviceStatus>, RegistryError> {
        let entry: &Entry = self.entries.get(id.0).ok_or(RegistryError::UnknownDevice(id))?;

        let previous: DeviceStatus = {
            let mut state = entry.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.last_checked.is_some_and(|last| last > checked_at) {
                return Ok(None);
            }
            let previous: DeviceStatus = state.status;
            *state = DeviceState {
                status,
                last_checked: Some(checked_at),
            };
            previous
        };

        self.revision.send_modify(|rev| *rev += 1);
        Ok(Some(previous))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}

fn snapshot(id: DeviceId, entry: &Entry) -> DeviceSnapshot {
    let state: DeviceState = *entry.state.read().unwrap_or_else(PoisonError::into_inner);
    DeviceSnapshot {
        id,
        device: entry.device.clone(),
        status: state.status,
        last_checked: state.last_checked,
    }
}
