mod commands;
mod terminal;

use anyhow::Context;
use commands::{CommandLine, Commands, list, monitor, status, wake};
use lanwake_common::config::{Config, ProbeMethod};
use terminal::{logging, print};
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);
    print::banner(commands.quiet);

    let mut cfg: Config = Config::load(&commands.config)
        .with_context(|| format!("loading {}", commands.config.display()))?;
    commands.apply(&mut cfg);

    if cfg.monitor.probe == ProbeMethod::Icmp && !is_root::is_root() {
        warn!("ICMP probing may need elevated privileges; pass --tcp if every device shows Error");
    }

    match commands.command {
        Commands::Monitor => {
            print::header("monitoring devices", cfg.quiet);
            monitor::monitor(&cfg).await
        }
        Commands::Status => {
            print::header("probing devices", cfg.quiet);
            status::status(&cfg).await
        }
        Commands::List => {
            print::header("configured devices", cfg.quiet);
            list::list(&cfg);
            Ok(())
        }
        Commands::Wake { target, force } => {
            print::header("wake on lan", cfg.quiet);
            wake::wake(&target, force, &cfg).await
        }
    }
}
