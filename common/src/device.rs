//! # Device Model
//!
//! A [`Device`] is the immutable identity of a configured host. The mutable half,
//! its [`DeviceStatus`] and the time it was last checked, lives next to it in the
//! registry and is exposed to readers as a [`DeviceSnapshot`].

use std::fmt;

use chrono::{DateTime, Utc};
use pnet::util::MacAddr;

/// Position of a device inside the registry. Stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    /// IP literal or hostname, resolved on every probe.
    pub address: String,
    pub hardware_address: MacAddr,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>, hardware_address: MacAddr) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            hardware_address,
        }
    }
}

/// Liveness of a device as seen by the most recent completed probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeviceStatus {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Online,
    Offline,
    /// The probe itself failed locally (resolution, socket).
    Error,
}

impl DeviceStatus {
    /// Whether sending a magic packet makes sense for this status.
    pub fn can_wake(self) -> bool {
        self != DeviceStatus::Online
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceStatus::Unknown => "Unknown",
            DeviceStatus::Online => "Online",
            DeviceStatus::Offline => "Offline",
            DeviceStatus::Error => "Error",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of one registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub device: Device,
    pub status: DeviceStatus,
    pub last_checked: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    pub fn can_wake(&self) -> bool {
        self.status.can_wake()
    }
}
