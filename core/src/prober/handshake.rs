use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout};
use tracing::trace;

use super::{ProbeOutcome, Prober, resolve};

/// Detects hosts by attempting a TCP handshake.
///
/// Both an accepted and a refused connection prove the host is up; only
/// silence until the deadline counts as unreachable.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeProber {
    port: u16,
}

impl HandshakeProber {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl Prober for HandshakeProber {
    async fn probe(&self, address: &str, limit: Duration) -> ProbeOutcome {
        let started: Instant = Instant::now();
        let ip = match resolve(address, limit).await {
            Ok(ip) => ip,
            Err(reason) => return ProbeOutcome::ProbeFailed(reason),
        };
        let socket_addr: SocketAddr = SocketAddr::new(ip, self.port);
        let remaining: Duration = limit.saturating_sub(started.elapsed());

        match timeout(remaining, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_)) => ProbeOutcome::Reachable,
            Ok(Err(e)) => classify(e.kind(), &e.to_string()),
            Err(_elapsed) => {
                trace!(%socket_addr, "handshake timed out");
                ProbeOutcome::Unreachable
            }
        }
    }
}

fn classify(kind: ErrorKind, reason: &str) -> ProbeOutcome {
    match kind {
        ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset => ProbeOutcome::Reachable,
        ErrorKind::HostUnreachable | ErrorKind::TimedOut => ProbeOutcome::Unreachable,
        _ => ProbeOutcome::ProbeFailed(reason.to_string()),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
