pub mod list;
pub mod monitor;
pub mod status;
pub mod wake;

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lanwake_common::config::{Config, DEFAULT_CONFIG_FILE, ProbeMethod};

#[derive(Parser)]
#[command(name = "lanwake")]
#[command(about = "Watch hosts on the local network and wake them with magic packets.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Device list and settings
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Seconds to sleep between probing rounds
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,

    /// Milliseconds to wait for each probe's reply
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of probes in flight
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Abandon probes still running after this many seconds
    #[arg(long, global = true)]
    pub deadline: Option<u64>,

    /// Probe with a TCP handshake instead of ICMP echo
    #[arg(long, global = true)]
    pub tcp: bool,

    /// Broadcast address for magic packets
    #[arg(short, long, global = true)]
    pub broadcast: Option<Ipv4Addr>,

    /// Reduce output; repeat for less
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe devices continuously and print their status after every round
    #[command(alias = "m")]
    Monitor,
    /// Probe every device once
    #[command(alias = "s")]
    Status,
    /// Show the configured devices without probing
    #[command(alias = "l")]
    List,
    /// Send a magic packet to a configured device or a raw MAC address
    #[command(alias = "w")]
    Wake {
        /// Device name or hardware address
        target: String,
        /// Send even if the device currently answers probes
        #[arg(short, long)]
        force: bool,
    },
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Applies command-line overrides on top of the file configuration.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(secs) = self.interval {
            cfg.monitor.interval_secs = secs;
        }
        if let Some(ms) = self.timeout {
            cfg.monitor.probe_timeout_ms = ms;
        }
        if let Some(limit) = self.concurrency {
            cfg.monitor.max_concurrency = limit;
        }
        if let Some(secs) = self.deadline {
            cfg.monitor.round_deadline_secs = Some(secs);
        }
        if self.tcp {
            cfg.monitor.probe = ProbeMethod::Tcp;
        }
        if let Some(addr) = self.broadcast {
            cfg.wake.broadcast = addr;
        }
        cfg.quiet = self.quiet;
    }
}
