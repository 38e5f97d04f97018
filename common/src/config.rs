//! # Configuration
//!
//! The device list and runtime settings are read from a JSON file, by default
//! `WOL-config.json` in the working directory:
//!
//! ```json
//! {
//!   "devices": [ { "name": "Desk", "ip": "192.168.1.20", "mac": "AA:BB:CC:DD:EE:FF" } ],
//!   "monitor": { "interval_secs": 5, "probe_timeout_ms": 1000 },
//!   "wake": { "broadcast": "255.255.255.255", "port": 9 }
//! }
//! ```
//!
//! Every section except `devices` is optional. A missing file is not an error:
//! the monitor simply runs with no devices.

use std::fs;
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::device::Device;
use crate::error::ConfigError;
use crate::network::mac;

pub const DEFAULT_CONFIG_FILE: &str = "WOL-config.json";

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;
pub const DEFAULT_TCP_PORT: u16 = 443;
pub const DEFAULT_WAKE_PORT: u16 = 9;

/// How reachability is tested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    /// ICMP echo request.
    #[default]
    Icmp,
    /// TCP handshake, usable without raw socket privileges.
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    pub interval_secs: u64,
    pub probe_timeout_ms: u64,
    /// Upper bound on probes in flight during a round.
    pub max_concurrency: usize,
    /// Abandon whatever is still probing once a round has run this long.
    pub round_deadline_secs: Option<u64>,
    pub probe: ProbeMethod,
    pub tcp_port: u16,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL.as_secs(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT.as_millis() as u64,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            round_deadline_secs: None,
            probe: ProbeMethod::default(),
            tcp_port: DEFAULT_TCP_PORT,
        }
    }
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn round_deadline(&self) -> Option<Duration> {
        self.round_deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WakeSettings {
    /// Limited (`255.255.255.255`) or subnet-directed broadcast address.
    pub broadcast: Ipv4Addr,
    pub port: u16,
}

impl Default for WakeSettings {
    fn default() -> Self {
        Self {
            broadcast: Ipv4Addr::BROADCAST,
            port: DEFAULT_WAKE_PORT,
        }
    }
}

impl WakeSettings {
    pub fn target(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.broadcast, self.port))
    }
}

#[derive(Debug, Deserialize)]
struct DeviceEntry {
    name: String,
    ip: String,
    mac: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    devices: Vec<DeviceEntry>,
    #[serde(default)]
    monitor: MonitorSettings,
    #[serde(default)]
    wake: WakeSettings,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub devices: Vec<Device>,
    pub monitor: MonitorSettings,
    pub wake: WakeSettings,
    /// Terminal verbosity: 0 prints everything, 1 drops decoration, 2 only results.
    pub quiet: u8,
}

impl Config {
    /// Loads the configuration at `path`, falling back to an empty device
    /// list when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: String = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Configuration file does not exist, please create it. Continuing with no devices"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_json(&raw).map_err(|e| match e {
            ParseFailure::Json(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseFailure::Device(err) => err,
        })
    }

    /// Parses configuration text that did not come from a file.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Self::from_json(raw).map_err(|e| match e {
            ParseFailure::Json(source) => ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            },
            ParseFailure::Device(err) => err,
        })
    }

    fn from_json(raw: &str) -> Result<Self, ParseFailure> {
        let file: ConfigFile = serde_json::from_str(raw).map_err(ParseFailure::Json)?;
        let devices: Vec<Device> = file
            .devices
            .into_iter()
            .map(into_device)
            .collect::<Result<_, _>>()
            .map_err(ParseFailure::Device)?;

        Ok(Self {
            devices,
            monitor: file.monitor,
            wake: file.wake,
            quiet: 0,
        })
    }
}

enum ParseFailure {
    Json(serde_json::Error),
    Device(ConfigError),
}

fn into_device(entry: DeviceEntry) -> Result<Device, ConfigError> {
    match mac::parse_mac(&entry.mac) {
        Ok(hardware_address) => Ok(Device::new(entry.name, entry.ip, hardware_address)),
        Err(source) => Err(ConfigError::InvalidDevice {
            name: entry.name,
            source,
        }),
    }
}
