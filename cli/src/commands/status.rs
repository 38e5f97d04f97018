use colored::*;
use lanwake_common::config::Config;
use lanwake_core::Runtime;
use lanwake_core::coordinator::RoundSummary;
use tokio_util::sync::CancellationToken;

use crate::terminal::{colors, print, spinner};

pub async fn status(cfg: &Config) -> anyhow::Result<()> {
    let runtime: Runtime = Runtime::new(cfg);
    let total: usize = runtime.registry.len();
    let cancel: CancellationToken = CancellationToken::new();
    let mut revisions = runtime.registry.subscribe();

    let progress = spinner::start(&spinner::probe_progress(0, total));
    let round = runtime.monitor.run_rounds(1, &cancel);
    tokio::pin!(round);

    let summaries: Vec<RoundSummary> = loop {
        tokio::select! {
            summaries = &mut round => break summaries,
            Ok(()) = revisions.changed() => {
                let done = *revisions.borrow_and_update() as usize;
                progress.set_message(spinner::probe_progress(done, total));
            }
            _ = tokio::signal::ctrl_c() => cancel.cancel(),
        }
    };
    drop(progress);

    print::device_table(&runtime.registry.list());
    if let Some(summary) = summaries.first() {
        print_summary(summary, cfg.quiet);
    }
    Ok(())
}

pub fn print_summary(summary: &RoundSummary, q_level: u8) {
    let online: ColoredString = format!("{} online", summary.online).bold().green();
    let offline: ColoredString = format!("{} offline", summary.offline).bold();
    let errored: ColoredString = format!("{} errored", summary.errored).bold().red();
    let total_time: ColoredString = format!("{:.2}s", summary.elapsed.as_secs_f64()).bold().yellow();
    let output: String = format!("Round complete: {online}, {offline}, {errored} in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print_status(&output),
    }
    if summary.abandoned > 0 {
        print::print_status(format!("{} probe(s) abandoned", summary.abandoned));
    }
}
