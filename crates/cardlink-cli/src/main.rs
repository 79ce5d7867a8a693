//! `cardlink`: command line client for the card reader service.

mod cli;
mod commands;
mod render;

use clap::Parser;
use cli::{Cli, Command};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout only carries command output.
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Read {
            service,
            timeout_ms,
            format,
        } => commands::read(&service, timeout_ms, format).await,
        Command::Listen { service } => commands::listen(&service).await,
        Command::Decode { input, format } => commands::decode(&input, format).await,
        Command::Emulate {
            bind,
            message,
            delay_ms,
            hold_open,
        } => commands::emulate(bind, message.as_deref(), delay_ms, hold_open).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
