mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sakura_api::PanelClient;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug bodies are logged at debug level
    let verbosity = if cli.global.debug {
        cli.global.verbose.max(2)
    } else {
        cli.global.verbose
    };
    init_tracing(verbosity);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the panel
        Command::Config(args) => commands::config_cmd::handle(&args, &cli.global),

        cmd => {
            let panel = config::resolve(&cli.global)?;
            let mut client = PanelClient::new(panel).map_err(CliError::Api)?;
            if cli.global.debug {
                client.debug();
            }

            tracing::debug!(command = ?cmd, node_id = client.node_id(), "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}
