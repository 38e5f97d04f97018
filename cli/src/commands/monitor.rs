use std::future::Future;
use std::ops::ControlFlow;

use anyhow::Context;
use lanwake_common::config::Config;
use lanwake_common::device::DeviceId;
use lanwake_core::Runtime;
use lanwake_core::events::Event;
use lanwake_core::registry::Registry;
use lanwake_core::wake::{WakeError, WakeService};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::commands::status;
use crate::terminal::print;

pub async fn monitor(cfg: &Config) -> anyhow::Result<()> {
    let Runtime {
        registry,
        events,
        monitor,
        wake,
    } = Runtime::new(cfg);

    let cancel: CancellationToken = CancellationToken::new();
    let feed = events.subscribe();
    let revisions = registry.subscribe();
    let handle = monitor.spawn(cancel.clone());

    print::print_status("Type a device number or name to wake it, 'q' to quit");
    let console = Console {
        registry: &registry,
        wake: &wake,
        quiet: cfg.quiet,
    };
    console
        .run(BufReader::new(tokio::io::stdin()), ctrl_c(), feed, revisions)
        .await;

    cancel.cancel();
    handle.await.context("monitor task panicked")?;
    print::end_of_program();
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, type 'q' to quit");
        std::future::pending::<()>().await;
    }
}

/// Operator side of `monitor`: redraws the table on every registry revision
/// and turns typed lines into wake requests.
struct Console<'a> {
    registry: &'a Registry,
    wake: &'a WakeService,
    quiet: u8,
}

impl Console<'_> {
    /// Runs until `shutdown` completes, the operator quits, or the core goes
    /// away. Returns how many times the table was drawn.
    async fn run<R, S>(
        &self,
        input: R,
        shutdown: S,
        mut feed: broadcast::Receiver<Event>,
        mut revisions: watch::Receiver<u64>,
    ) -> usize
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut lines = input.lines();
        let mut stdin_open: bool = true;
        let mut redraws: usize = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                changed = revisions.changed() => match changed {
                    Ok(()) => {
                        crate::mprint!();
                        print::device_table(&self.registry.list());
                        redraws += 1;
                    }
                    Err(_) => break,
                },
                event = feed.recv() => match event {
                    Ok(Event::RoundFinished(summary)) => status::print_summary(&summary, self.quiet),
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "event feed lagged"),
                    Err(RecvError::Closed) => break,
                },
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if handle_input(line.trim(), self.registry, self.wake).is_break() {
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(error = %e, "stopped reading commands from stdin");
                        stdin_open = false;
                    }
                },
            }
        }

        redraws
    }
}

/// Resolves a row number or device name typed by the operator.
fn lookup(input: &str, registry: &Registry) -> Option<DeviceId> {
    input
        .parse::<usize>()
        .ok()
        .map(DeviceId)
        .filter(|id| registry.get(*id).is_some())
        .or_else(|| registry.find_by_name(input))
}

fn handle_input(input: &str, registry: &Registry, wake: &WakeService) -> ControlFlow<()> {
    match input {
        "" => ControlFlow::Continue(()),
        "q" | "quit" | "exit" => ControlFlow::Break(()),
        other => {
            match lookup(other, registry) {
                Some(id) => match wake.wake_device(id) {
                    Ok(()) | Err(WakeError::Transmit(_)) => {}
                    Err(WakeError::AlreadyOnline(name)) => warn!("{name} is online, not sending"),
                    Err(e) => warn!(error = %e, "wake failed"),
                },
                None => warn!(input = other, "no such device"),
            }
            ControlFlow::Continue(())
        }
    }
}
