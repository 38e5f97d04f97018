use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lanwake_common::config::Config;
use lanwake_common::device::Device;
use lanwake_common::error::TransmitError;
use lanwake_common::network::mac::parse_mac;
use lanwake_core::prober::{ProbeOutcome, Prober};
use lanwake_core::wake::DatagramSink;

/// Answers probes from a table keyed by address. Unknown addresses stay
/// silent. Outcomes can be changed between rounds.
#[derive(Default)]
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
}

impl ScriptedProber {
    pub fn with(entries: &[(&str, ProbeOutcome)]) -> Self {
        let prober = Self::default();
        for (address, outcome) in entries {
            prober.set(address, outcome.clone());
        }
        prober
    }

    pub fn set(&self, address: &str, outcome: ProbeOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(address.to_string(), outcome);
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, address: &str, _timeout: Duration) -> ProbeOutcome {
        let outcome = self.outcomes.lock().unwrap().get(address).cloned();
        outcome.unwrap_or(ProbeOutcome::Unreachable)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

impl DatagramSink for RecordingSink {
    fn send_to(&self, payload: &[u8], target: SocketAddr) -> Result<(), TransmitError> {
        self.sent.lock().unwrap().push((payload.to_vec(), target));
        Ok(())
    }
}

pub fn device(name: &str, address: &str, mac: &str) -> Device {
    Device::new(name, address, parse_mac(mac).unwrap())
}

pub fn config(devices: Vec<Device>) -> Config {
    let mut cfg = Config {
        devices,
        ..Config::default()
    };
    cfg.monitor.interval_secs = 0;
    cfg
}
