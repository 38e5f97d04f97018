//! # Reachability probing
//!
//! A [`Prober`] answers one question about one host: did it reply within the
//! timeout? Two strategies are provided:
//!
//! * [`IcmpProber`]: a single ICMP echo request.
//! * [`HandshakeProber`]: a TCP connect, for hosts or environments where ICMP
//!   sockets are unavailable.
//!
//! "No reply" is the expected outcome for a sleeping host and is reported as
//! [`ProbeOutcome::Unreachable`], never as a failure.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use lanwake_common::device::DeviceStatus;
use tokio::net::lookup_host;
use tokio::time::timeout;

mod handshake;
mod icmp;

pub use handshake::HandshakeProber;
pub use icmp::IcmpProber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
    /// The probe could not be carried out (name resolution, socket error).
    ProbeFailed(String),
}

impl ProbeOutcome {
    pub fn status(&self) -> DeviceStatus {
        match self {
            ProbeOutcome::Reachable => DeviceStatus::Online,
            ProbeOutcome::Unreachable => DeviceStatus::Offline,
            ProbeOutcome::ProbeFailed(_) => DeviceStatus::Error,
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Tests `address` once, waiting at most `timeout` for a reply.
    async fn probe(&self, address: &str, timeout: Duration) -> ProbeOutcome;
}

/// Turns an IP literal or hostname into the first address it resolves to.
pub async fn resolve(address: &str, limit: Duration) -> Result<IpAddr, String> {
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(ip);
    }

    match timeout(limit, lookup_host((address, 0))).await {
        Ok(Ok(mut addrs)) => addrs
            .next()
            .map(|sock| sock.ip())
            .ok_or_else(|| format!("{address} resolved to no addresses")),
        Ok(Err(e)) => Err(format!("failed to resolve {address}: {e}")),
        Err(_elapsed) => Err(format!("resolving {address} timed out")),
    }
}
