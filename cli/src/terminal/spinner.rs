use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_STRINGS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

/// The spinner currently on screen, if any. Log output is routed through it
/// so lines are printed above the spinner instead of through it.
static ACTIVE: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Clears the spinner when dropped.
pub struct SpinnerGuard {
    spinner: ProgressBar,
}

impl SpinnerGuard {
    pub fn set_message(&self, msg: String) {
        self.spinner.set_message(msg);
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
        ACTIVE.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

pub fn start(msg: &str) -> SpinnerGuard {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(TICK_STRINGS));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());

    *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb.clone());
    SpinnerGuard { spinner: pb }
}

pub fn probe_progress(done: usize, total: usize) -> String {
    format!(
        "Probed {} of {} devices...",
        done.to_string().green().bold(),
        total.to_string().bold()
    )
}

/// `MakeWriter` target for the tracing subscriber.
pub struct TerminalWriter;

impl Write for TerminalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let active = ACTIVE.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_ref() {
            Some(pb) => {
                let msg = String::from_utf8_lossy(buf);
                pb.println(msg.trim_end());
            }
            None => io::stdout().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
