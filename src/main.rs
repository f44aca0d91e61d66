use anyhow::Result;
use clap::Parser;

use idle_sweeper::cli::Cli;
use idle_sweeper::commands;
use idle_sweeper::config::Config;

fn main() -> Result<()> {
    // Usage errors exit with 1 rather than clap's 2; help and version with 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())?;

    tracing::debug!(?config, "Loaded configuration");

    if let Some(reason) = commands::watch::run(&cli, &config)? {
        tracing::info!(?reason, "Exiting");
    }

    Ok(())
}

fn init_logging(verbosity: u8, quiet: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "warn"
    } else {
        match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("idle_sweeper={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
