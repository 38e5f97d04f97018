use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::{ProbeOutcome, Prober, resolve};

const ECHO_PAYLOAD: [u8; 56] = [0; 56];

/// Detects hosts with a single ICMP echo request.
///
/// One socket per address family is opened on first use and shared by every
/// probe afterwards. If opening fails the probe reports
/// [`ProbeOutcome::ProbeFailed`] and the next probe tries again.
#[derive(Default)]
pub struct IcmpProber {
    v4: OnceCell<Client>,
    v6: OnceCell<Client>,
}

impl IcmpProber {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self, ip: &IpAddr) -> std::io::Result<&Client> {
        match ip {
            IpAddr::V4(_) => {
                self.v4
                    .get_or_try_init(|| async { Client::new(&Config::default()) })
                    .await
            }
            IpAddr::V6(_) => {
                self.v6
                    .get_or_try_init(|| async {
                        Client::new(&Config::builder().kind(ICMP::V6).build())
                    })
                    .await
            }
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, address: &str, limit: Duration) -> ProbeOutcome {
        let started: Instant = Instant::now();
        let ip: IpAddr = match resolve(address, limit).await {
            Ok(ip) => ip,
            Err(reason) => return ProbeOutcome::ProbeFailed(reason),
        };

        let client: &Client = match self.client(&ip).await {
            Ok(client) => client,
            Err(e) => {
                debug!(error = %e, "failed to open ICMP socket");
                return ProbeOutcome::ProbeFailed(format!("failed to open ICMP socket: {e}"));
            }
        };

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(limit.saturating_sub(started.elapsed()));

        match pinger.ping(PingSequence(0), &ECHO_PAYLOAD).await {
            Ok((_reply, rtt)) => {
                trace!(%ip, ?rtt, "echo reply");
                ProbeOutcome::Reachable
            }
            Err(SurgeError::Timeout { .. }) => ProbeOutcome::Unreachable,
            Err(e) => ProbeOutcome::ProbeFailed(e.to_string()),
        }
    }
}
