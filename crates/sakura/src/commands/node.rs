//! Read-only panel commands: node info, users, rules, describe.

use secrecy::ExposeSecret;
use serde::Serialize;
use tabled::Tabled;

use sakura_api::{DetectRule, NodeInfo, PanelClient, UserInfo};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "UID")]
    uid: i64,
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "Alter ID")]
    alter_id: u16,
    #[tabled(rename = "Speed (B/s)")]
    speed_limit: u64,
    #[tabled(rename = "Devices")]
    device_limit: u32,
}

impl From<&UserInfo> for UserRow {
    fn from(u: &UserInfo) -> Self {
        Self {
            uid: u.uid,
            uuid: u.uuid.clone(),
            alter_id: u.alter_id,
            speed_limit: u.speed_limit,
            device_limit: u.device_limit,
        }
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
}

impl From<&DetectRule> for RuleRow {
    fn from(r: &DetectRule) -> Self {
        Self {
            id: if r.id == DetectRule::LOCAL_ID {
                "local".into()
            } else {
                r.id.to_string()
            },
            pattern: r.pattern.clone(),
        }
    }
}

/// Serializable `describe` view; the key is masked.
#[derive(Serialize)]
struct Description {
    api_host: String,
    node_id: i64,
    node_type: String,
    key: String,
    local_rules: usize,
    local_rule_warning: Option<String>,
}

fn node_detail(n: &NodeInfo) -> Vec<(&'static str, String)> {
    vec![
        ("Node ID", n.node_id.to_string()),
        ("Node Type", n.node_type.to_string()),
        ("Port", n.port.to_string()),
        ("Alter ID", n.alter_id.to_string()),
        ("Transport", n.transport_protocol.clone()),
        ("TLS", format!("{} {}", n.enable_tls, n.tls_type).trim().to_owned()),
        ("Host", n.host.clone()),
        ("Path", n.path.clone()),
        ("Service Name", n.service_name.clone()),
        ("Speed (B/s)", n.speed_limit.to_string()),
        ("VLESS", n.enable_vless.to_string()),
        (
            "Header",
            n.header.as_ref().map(ToString::to_string).unwrap_or_default(),
        ),
    ]
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".into()
    } else {
        format!("{visible}****")
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn node_info(client: &PanelClient, global: &GlobalOpts) -> Result<(), CliError> {
    let info = client
        .get_node_info()
        .await
        .map_err(|e| CliError::from_api(e, client.node_id()))?;
    let out = output::render_single(&global.output, &info, node_detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn users(client: &PanelClient, global: &GlobalOpts) -> Result<(), CliError> {
    let users = client
        .get_user_list()
        .await
        .map_err(|e| CliError::from_api(e, client.node_id()))?;
    let out = output::render_list(&global.output, &users, |u| UserRow::from(u))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn rules(client: &PanelClient, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(warning) = client.local_rule_warning() {
        if !global.quiet {
            eprintln!("warning: {warning}");
        }
    }
    let rules = client
        .get_node_rule()
        .await
        .map_err(|e| CliError::from_api(e, client.node_id()))?;
    let out = output::render_list(&global.output, &rules, |r| RuleRow::from(r))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn describe(client: &PanelClient, global: &GlobalOpts) -> Result<(), CliError> {
    let info = client.describe();
    let view = Description {
        api_host: info.api_host,
        node_id: info.node_id,
        node_type: info.node_type.to_string(),
        key: mask(info.key.expose_secret()),
        local_rules: client.local_rules().len(),
        local_rule_warning: client.local_rule_warning().map(ToString::to_string),
    };
    let out = output::render_single(&global.output, &view, |d| {
        vec![
            ("API Host", d.api_host.clone()),
            ("Node ID", d.node_id.to_string()),
            ("Node Type", d.node_type.clone()),
            ("Key", d.key.clone()),
            ("Local Rules", d.local_rules.to_string()),
            (
                "Rule Warning",
                d.local_rule_warning.clone().unwrap_or_default(),
            ),
        ]
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_prefix_only() {
        assert_eq!(mask("qwertyuiop"), "qwer****");
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask(""), "****");
    }

    #[test]
    fn local_rules_show_as_local() {
        let row = RuleRow::from(&DetectRule::local("x"));
        assert_eq!(row.id, "local");
        let row = RuleRow::from(&DetectRule {
            id: 3,
            pattern: "y".into(),
        });
        assert_eq!(row.id, "3");
    }
}
