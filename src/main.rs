//! `tq` — the Queue CLI binary (§4.3).

use std::process::ExitCode;

use clap::Parser;
use ticketq::cli::{run, Cli};

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    run(cli)
}
