//! Command handlers.

pub mod config_cmd;
pub mod node;
pub mod report;

use sakura_api::PanelClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Run a panel command against a built client.
pub async fn dispatch(
    cmd: Command,
    client: &PanelClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::NodeInfo => node::node_info(client, global).await,
        Command::Users => node::users(client, global).await,
        Command::Rules => node::rules(client, global).await,
        Command::Describe => node::describe(client, global),
        Command::Report(args) => report::handle(client, args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}
