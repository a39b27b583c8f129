//! Report commands: status, online users, traffic, rule hits.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use sakura_api::{DetectResult, NodeStatus, OnlineUser, PanelClient, UserTraffic};

use crate::cli::{GlobalOpts, ReportArgs, ReportCommand};
use crate::error::CliError;

pub async fn handle(
    client: &PanelClient,
    args: ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let node_id = client.node_id();
    let what = match args.command {
        ReportCommand::Status {
            cpu,
            mem,
            disk,
            uptime,
        } => {
            let status = NodeStatus {
                cpu,
                mem,
                disk,
                uptime,
            };
            client.report_node_status(&status).await
        }
        ReportCommand::Online(arg) => {
            let users: Vec<OnlineUser> = read_json(&arg.file)?;
            client.report_node_online_users(&users).await
        }
        ReportCommand::Traffic(arg) => {
            let traffic: Vec<UserTraffic> = read_json(&arg.file)?;
            client.report_user_traffic(&traffic).await
        }
        ReportCommand::Illegal(arg) => {
            let hits: Vec<DetectResult> = read_json(&arg.file)?;
            client.report_illegal(&hits).await
        }
    };
    what.map_err(|e| CliError::from_api(e, node_id))?;

    if !global.quiet {
        eprintln!("Report accepted");
    }
    Ok(())
}

/// Read a JSON document from a file, or stdin for `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let display = path.display().to_string();
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Input {
                path: display.clone(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Input {
            path: display.clone(),
            source,
        })?
    };

    serde_json::from_str(&text).map_err(|source| CliError::InputJson {
        path: display,
        source,
    })
}
